// Canonical JSON layer shared by hashing, signing and the wire format.
//
// The network identity of a block is the exact byte sequence produced here,
// so every field that feeds a hash must round-trip through these helpers.
// Canonical form: compact separators, struct fields in declaration order,
// integers as bare digits, standard JSON string escaping.
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize a value to its canonical JSON text.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Parse a value from JSON text.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}
