//! Canonical serialization: the unique byte form a document is hashed from.
//!
//! Rules, applied recursively:
//!   1. object keys are sorted by their UTF-8 bytes
//!   2. arrays keep their element order
//!   3. strings use standard JSON escaping
//!   4. integers print as plain decimal digits; a float with no fractional
//!      part inside the exactly representable range (|x| < 2^53) prints as
//!      an integer, any other float prints in its shortest round-trip form
//!   5. no insignificant whitespace
//!
//! An absent key and a key mapped to `null` produce different output.  The
//! canonicalizer never drops keys: hash-field exclusion is the caller's job
//! (see `hasher::strip_hash_field`).

use serde_json::{Map, Number, Value};

/// Largest magnitude below which every integer is exactly representable as
/// an `f64`.
const MAX_SAFE_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Serialize `value` into canonical bytes.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    canonical_string(value).into_bytes()
}

/// Serialize `value` into a canonical JSON string.
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

/// Equality under canonicalization: `true` exactly when both values
/// serialize to the same canonical bytes.
///
/// Numbers compare by their canonical text, so `1` and `1.0` are equal;
/// object key order is irrelevant; `null` still differs from any other value.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => format_number(l) == format_number(r),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => maps_equal(l, r),
        _ => left == right,
    }
}

/// [`values_equal`] over two JSON objects.
pub fn maps_equal(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, l)| right.get(key).is_some_and(|r| values_equal(l, r)))
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(n)),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

            out.push('{');
            for (idx, (key, item)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    // `Value`'s Display emits compact JSON with standard escaping.
    out.push_str(&Value::String(s.to_owned()).to_string());
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE_FLOAT_INT => (f as i64).to_string(),
        _ => n.to_string(),
    }
}
