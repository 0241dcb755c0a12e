//! crates/pmq_io/src/hasher.rs
//!
//! Deterministic hashing and id builders.
//! - `sha256_hex` over raw bytes (snapshot files).
//! - `sha256_canonical_value` over canonical JSON bytes (report documents).
//! - `report_id_for` builds `RPT:<hex64>` from a report value without its `id`.
//! Hex digests are lowercase.

use serde_json::Value;
use sha2::{Digest, Sha256};

use pmq_core::ids::ReportId;

use crate::canonical_json::to_canonical_json_bytes;
use crate::{IoError, IoResult};

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 over the canonical JSON bytes of an already-built value.
pub fn sha256_canonical_value(v: &Value) -> String {
    sha256_hex(&to_canonical_json_bytes(v))
}

/// `RPT:` id for a report value. Any top-level `id` field is ignored so the
/// id never hashes itself.
pub fn report_id_for(report: &Value) -> IoResult<ReportId> {
    let digest = match report {
        Value::Object(map) if map.contains_key("id") => {
            let mut stripped = map.clone();
            stripped.remove("id");
            sha256_canonical_value(&Value::Object(stripped))
        }
        other => sha256_canonical_value(other),
    };
    ReportId::from_digest(&digest).map_err(|e| IoError::Hash(e.to_string()))
}
