//! ATTEST — audit-packet integrity and diff CLI
//!
//! Hashes, seals and verifies audit packets, and compares two packets into a
//! reviewable, hash-stamped diff.  Packets named by hash are resolved from a
//! local on-disk cache; packets given as files are accepted directly and
//! cached under their embedded `packetHash`.
//!
//! Usage:
//!   attest hash packet.json
//!   attest seal packet.json -o sealed.json
//!   attest verify sealed.json
//!   attest verify --diff audit-diff-1a2b3c4d-5e6f7a8b.json
//!   attest diff left.json <64-hex hash> --summary --export out/

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use attest_contracts::{
    config::AttestConfig,
    error::{AttestError, AttestResult},
    verify::{Verdict, VerificationResult},
};
use attest_core::{Comparator, PacketInput, PacketStore};
use attest_diff::{render_summary, DiffEngine, DiffExporter};
use attest_integrity::PacketVerifier;
use attest_store::{FsPacketStore, OfflineRemote};

// ── CLI definition ────────────────────────────────────────────────────────────

/// ATTEST — tamper-evident hashing and diffing for decision audit packets.
#[derive(Parser)]
#[command(
    name = "attest",
    about = "Audit-packet integrity and diff engine",
    long_about = "Computes deterministic content hashes for audit packets, verifies\n\
                  embedded hashes (PASS / FAIL / PENDING), and diffs two packets into\n\
                  an exportable, independently verifiable change report."
)]
struct Cli {
    /// TOML configuration file.  Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the content hash of a packet file.
    Hash { file: PathBuf },
    /// Embed a freshly computed packetHash and print the sealed packet.
    Seal {
        file: PathBuf,
        /// Write the sealed packet here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Verify a packet's embedded hash, or a diff artifact's with --diff.
    Verify {
        file: PathBuf,
        #[arg(long)]
        diff: bool,
    },
    /// Compare two packets, each given as a file path or a packet hash.
    Diff {
        left: String,
        right: String,
        /// Local packet cache directory.
        #[arg(long, default_value = ".attest/packets")]
        store: PathBuf,
        /// Write a hash-stamped diff artifact into this directory.
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print a Markdown summary instead of the JSON diff.
        #[arg(long)]
        summary: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run one command and return the process exit code.
async fn run(cli: Cli) -> AttestResult<i32> {
    let config = match &cli.config {
        Some(path) => AttestConfig::from_file(path)?,
        None => AttestConfig::default(),
    };
    let verifier = Arc::new(PacketVerifier::new(&config.integrity)?);

    match cli.command {
        Command::Hash { file } => {
            let packet = verifier.parse_packet_str(&read_file(&file)?)?;
            println!("{}", verifier.compute_hash(&packet));
            Ok(0)
        }
        Command::Seal { file, output } => {
            let document = serde_json::from_str(&read_file(&file)?)
                .map_err(|e| AttestError::malformed(format!("packet is not valid JSON: {e}")))?;
            let sealed = verifier.seal_packet(document)?;
            let text = to_pretty(&sealed.to_value());
            match output {
                Some(path) => write_file(&path, &text)?,
                None => println!("{}", text),
            }
            Ok(0)
        }
        Command::Verify { file, diff } => {
            let raw = read_file(&file)?;
            let result = if diff {
                let document = serde_json::from_str(&raw).map_err(|e| {
                    AttestError::malformed(format!("artifact is not valid JSON: {e}"))
                })?;
                verifier.verify_diff_artifact(&document)?
            } else {
                verifier.verify_json(&raw)?
            };
            print_verification(&result);
            Ok(exit_code(result.verdict()))
        }
        Command::Diff {
            left,
            right,
            store,
            export,
            summary,
        } => {
            let packets = PacketStore::new(
                Arc::new(FsPacketStore::new(store)),
                Arc::new(OfflineRemote),
                verifier.clone(),
            );
            let comparator = Comparator::new(packets, DiffEngine::new(config.diff.clone()));

            let comparison = match comparator
                .compare(&side_input(&left)?, &side_input(&right)?)
                .await
            {
                Ok(comparison) => comparison,
                Err(failure) => {
                    for (side, error) in [("left", failure.left), ("right", failure.right)] {
                        if let Some(error) = error {
                            eprintln!("error: {side} packet: {error}");
                        }
                    }
                    return Ok(1);
                }
            };

            for warning in comparison.left.warnings.iter().chain(&comparison.right.warnings) {
                eprintln!("warning: {}", warning);
            }

            if summary {
                print!("{}", render_summary(&comparison.diff));
            } else {
                let document = serde_json::to_value(&comparison.diff)
                    .map_err(|e| AttestError::malformed(format!("failed to encode diff: {e}")))?;
                println!("{}", to_pretty(&document));
            }

            if let Some(dir) = export {
                let exporter = DiffExporter::new(*verifier.hasher(), config.export.clone());
                let artifact = exporter.export(&comparison.diff)?;
                let path = dir.join(&artifact.file_name);
                write_file(&path, &artifact.to_pretty_json())?;
                eprintln!("exported {} (diffHash {})", path.display(), artifact.diff_hash);
            }
            Ok(0)
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A side is a file when one exists at that path, otherwise a packet hash.
fn side_input(arg: &str) -> AttestResult<PacketInput> {
    let path = Path::new(arg);
    if path.is_file() {
        Ok(PacketInput::Pasted(read_file(path)?))
    } else {
        Ok(PacketInput::Hash(arg.to_string()))
    }
}

fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Fail => 2,
        Verdict::Pending => 3,
    }
}

fn print_verification(result: &VerificationResult) {
    let verdict = result.verdict();
    println!("verdict:  {} ({})", verdict, verdict.describe());
    println!("claimed:  {}", result.claimed.as_deref().unwrap_or("(none)"));
    println!("computed: {}", result.computed.as_deref().unwrap_or("(none)"));
}

fn read_file(path: &Path) -> AttestResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AttestError::storage(format!("failed to read '{}': {}", path.display(), e)))
}

fn write_file(path: &Path, contents: &str) -> AttestResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AttestError::storage(format!("failed to create '{}': {}", parent.display(), e))
        })?;
    }
    std::fs::write(path, contents)
        .map_err(|e| AttestError::storage(format!("failed to write '{}': {}", path.display(), e)))
}

fn to_pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn side_input_prefers_existing_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("left.json");
        std::fs::write(&file, "{}").unwrap();

        assert_eq!(
            side_input(file.to_str().unwrap()).unwrap(),
            PacketInput::Pasted("{}".to_string())
        );
        let hash = "a".repeat(64);
        assert_eq!(side_input(&hash).unwrap(), PacketInput::Hash(hash.clone()));
    }

    #[test]
    fn verdicts_map_to_distinct_exit_codes() {
        assert_eq!(exit_code(Verdict::Pass), 0);
        assert_ne!(exit_code(Verdict::Fail), exit_code(Verdict::Pending));
        assert_ne!(exit_code(Verdict::Fail), 1, "FAIL must not look like an error");
    }

    #[test]
    fn write_file_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");

        write_file(&path, "{}").unwrap();
        assert_eq!(read_file(&path).unwrap(), "{}");
    }
}
