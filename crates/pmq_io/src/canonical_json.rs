//! Canonical JSON for report ids and artifacts.
//!
//! Object keys are emitted in byte order at every depth, arrays keep their
//! order, and output is compact with no trailing newline. Sorting happens in
//! the serializer, so the result does not depend on how `serde_json::Map` was
//! built.

use std::io::Write;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::{IoError, IoResult};

/// Borrowing view of a `Value` that serializes with sorted keys.
struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Array(items) => {
                let mut seq = ser.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Canonical(item))?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort_unstable();
                let mut out = ser.serialize_map(Some(keys.len()))?;
                for k in keys {
                    out.serialize_entry(k, &Canonical(&map[k.as_str()]))?;
                }
                out.end()
            }
            leaf => leaf.serialize(ser),
        }
    }
}

/// Canonical bytes of `v`.
pub fn to_canonical_json_bytes(v: &Value) -> Vec<u8> {
    // Writing a Value into a Vec cannot fail: keys are strings, no I/O.
    serde_json::to_vec(&Canonical(v)).unwrap_or_default()
}

/// Write canonical JSON to `path` atomically.
pub fn write_canonical_file(path: &Path, v: &Value) -> IoResult<()> {
    write_bytes_atomic(path, &to_canonical_json_bytes(v))
}

/// Write `bytes` to a temp file beside `path`, fsync it, then rename over `path`.
/// Readers see either the old file or the complete new one.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> IoResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| IoError::Path(format!("mkdir {}: {e}", dir.display())))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| IoError::Path(format!("rename onto {}: {}", path.display(), e.error)))?;
    Ok(())
}
