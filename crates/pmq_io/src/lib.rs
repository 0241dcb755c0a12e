//! crates/pmq_io/src/lib.rs
//! Local-file I/O for the quota engine.
//!
//! - `IoError`, shared by every loader and writer in this crate.
//! - Snapshot + config loading (offline only; URL-like paths are rejected).
//! - Canonical JSON bytes, atomic writes, SHA-256 digests and `RPT:` ids.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for pmq_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync, ...).
    #[error("file: {0}")]
    Path(String),

    /// JSON parse/shape errors with a pointer-like location hint.
    #[error("malformed JSON at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("digest: {0}")]
    Hash(String),

    /// Domain validation failures (config values, snapshot shape).
    #[error("rejected input: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer; default to root.
        IoError::Json {
            pointer: "/".to_string(),
            msg: e.to_string(),
        }
    }
}

pub mod canonical_json;
pub mod config;
pub mod hasher;
pub mod snapshot;

/// Any `<scheme>://` counts, `file://` included. The engine reads local files only.
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::canonical_json::{to_canonical_json_bytes, write_bytes_atomic, write_canonical_file};
    pub use crate::config::load_config;
    pub use crate::hasher::{report_id_for, sha256_canonical_value, sha256_hex};
    pub use crate::snapshot::{load_snapshot, parse_snapshot, LoadedSnapshot, RawSnapshot};
    pub use crate::{looks_like_url_strict, IoError, IoResult};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection_is_strict() {
        assert!(looks_like_url_strict("https://example.org/snap.json"));
        assert!(looks_like_url_strict(" file:///tmp/x.json"));
        assert!(!looks_like_url_strict("/tmp/snap.json"));
        assert!(!looks_like_url_strict("C:\\data\\snap.json"));
    }
}
