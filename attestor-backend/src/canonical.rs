//! Deterministic payload canonicalization, hashing and value extraction.
//!
//! Attestation hashes must be reproducible by any client that rebuilds the
//! same logical payload, regardless of key insertion order, so object keys
//! are sorted lexicographically at every depth before serialization. The
//! hash primitive is Keccak-256 over the UTF-8 bytes of the canonical form,
//! matching what the on-chain verifier recomputes.

use ethers::utils::keccak256;
use serde_json::Value;

/// Serialize a value into its canonical compact form. Array order is
/// preserved; object keys are sorted recursively.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, val)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Keys are encoded as JSON strings (quoting, escapes)
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Keccak-256 digest of the canonical form.
pub fn hash(value: &Value) -> [u8; 32] {
    keccak256(canonicalize(value).as_bytes())
}

/// Digest as a 0x-prefixed lowercase hex string, the wire form of a run hash.
pub fn hash_hex(value: &Value) -> String {
    format!("0x{}", hex::encode(hash(value)))
}

/// Derive the extraction value from a payload's shape. Priority order:
/// `score`, then `extractionValue`, then the sum of `events[].value`, then
/// zero. Only one branch fires; a present-but-non-numeric field falls
/// through to the next branch.
pub fn extract_value(payload: &Value) -> u64 {
    if let Some(score) = clamp_number(payload.get("score")) {
        return score;
    }
    if let Some(explicit) = clamp_number(payload.get("extractionValue")) {
        return explicit;
    }
    if let Some(events) = payload.get("events").and_then(|e| e.as_array()) {
        // Individually valid values can still overflow u64 in aggregate
        return events
            .iter()
            .map(|event| clamp_number(event.get("value")).unwrap_or(0))
            .fold(0u64, u64::saturating_add);
    }
    0
}

/// Finite numbers only, floored and clamped to >= 0.
fn clamp_number(value: Option<&Value>) -> Option<u64> {
    let n = value?.as_f64()?;
    if !n.is_finite() {
        return None;
    }
    Some(n.max(0.0).floor() as u64)
}
