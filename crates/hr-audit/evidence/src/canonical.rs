//! Canonical JSON for hashing.
//!
//! Object keys sorted by byte order, no whitespace, strings escaped as
//! `serde_json` escapes them, integers in decimal, floats in their shortest
//! round-trip form. Identical content always yields identical bytes, including
//! after a round trip through the JSONL log, and distinct floats never share
//! bytes.

use crate::error::EvidenceError;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

pub fn canonical_json(value: &Value) -> Result<String, EvidenceError> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out)
}

/// `hex(SHA-256(canonical(sections) || parent_hash))`.
pub fn record_hash(sections: &Value, parent_hash: &str) -> Result<String, EvidenceError> {
    let canonical = canonical_json(sections)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.update(parent_hash.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn write_value(value: &Value, out: &mut String) -> Result<(), EvidenceError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(n)),
        Value::String(s) => out.push_str(&serde_json::to_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_value(v, out)?;
                }
            }
            out.push('}');
        }
    }
    Ok(())
}

fn format_number(n: &Number) -> String {
    if let Some(u) = n.as_u64() {
        u.to_string()
    } else if let Some(i) = n.as_i64() {
        i.to_string()
    } else {
        // serde_json prints finite f64 with ryu: shortest text that parses back
        // to the same bits.
        n.to_string()
    }
}
