//! Snapshot loading: the batch of already-queried records the engine runs on.
//!
//! Wire shape (all keys optional):
//! ```json
//! {
//!   "events":     [ {"unit_id": "U-1", "timestamp": "2026-07-03T08:00:00", "category": 39} ],
//!   "units":      [ {"unit_id": "U-1", "eligible": true, "updated_at": "2026-07-01"} ],
//!   "population": {"total": 570, "as_of": "2027-01-01"}
//! }
//! ```
//! `units` and `population` are mutually exclusive. Event fields and all
//! dates stay raw text here; the pipeline parses them so a bad value becomes a
//! per-record diagnostic instead of a load failure.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hasher::sha256_hex;
use crate::{looks_like_url_strict, IoError, IoResult};

/// A JSON scalar that may arrive as text or as a number (ids, category codes).
/// Anything else (floats, bools, arrays, objects) is kept as `Other` so one
/// bad record cannot fail the whole snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Text(String),
    Int(i64),
    Other(Value),
}

impl RawScalar {
    /// Text form of a string or integer; `None` for any other JSON type.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawScalar::Text(s) => Some(s.clone()),
            RawScalar::Int(n) => Some(n.to_string()),
            RawScalar::Other(_) => None,
        }
    }
}

impl fmt::Display for RawScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawScalar::Text(s) => f.write_str(s),
            RawScalar::Int(n) => write!(f, "{n}"),
            RawScalar::Other(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub unit_id: Option<RawScalar>,
    /// Kept as a scalar so a numeric timestamp is a per-event diagnostic.
    #[serde(default)]
    pub timestamp: Option<RawScalar>,
    #[serde(default)]
    pub category: Option<RawScalar>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUnit {
    pub unit_id: RawScalar,
    #[serde(default = "default_true")]
    pub eligible: bool,
    pub updated_at: String,
}

fn default_true() -> bool {
    true
}

/// Pre-counted population. `as_of` defaults to the horizon end downstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountedPopulation {
    pub total: u64,
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSnapshot {
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<RawUnit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<CountedPopulation>,
}

/// How the population is supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopulationInput<'a> {
    Counted(&'a CountedPopulation),
    Units(&'a [RawUnit]),
    /// Neither key present: "no data available", sized as zero.
    Absent,
}

impl RawSnapshot {
    pub fn population_input(&self) -> PopulationInput<'_> {
        match (&self.population, &self.units) {
            (Some(c), _) => PopulationInput::Counted(c),
            (None, Some(u)) => PopulationInput::Units(u),
            (None, None) => PopulationInput::Absent,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadedSnapshot {
    pub snapshot: RawSnapshot,
    /// SHA-256 of the raw file bytes.
    pub sha256: String,
}

/// Parse snapshot bytes and check the cross-key shape.
pub fn parse_snapshot(bytes: &[u8]) -> IoResult<RawSnapshot> {
    let snap: RawSnapshot = serde_json::from_slice(bytes)?;
    if snap.units.is_some() && snap.population.is_some() {
        return Err(IoError::Invalid(
            "snapshot carries both `units` and `population`; supply one".into(),
        ));
    }
    Ok(snap)
}

/// Read a snapshot from a local path. URL-like paths are refused.
pub fn load_snapshot(path: &Path) -> IoResult<LoadedSnapshot> {
    let shown = path.to_string_lossy();
    if looks_like_url_strict(&shown) {
        return Err(IoError::Path(format!("non-local path refused: {shown}")));
    }
    let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    let snapshot = parse_snapshot(&bytes)?;
    Ok(LoadedSnapshot {
        snapshot,
        sha256: sha256_hex(&bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_mixed_scalars_and_missing_fields() {
        let snap = parse_snapshot(
            br#"{"events":[
                {"unit_id":"U-1","timestamp":"2026-07-03T08:00:00","category":39},
                {"unit_id":42,"timestamp":"2026-07-04","category":"39","extra":"ignored"},
                {"timestamp":"2026-07-05"}
            ],"population":{"total":570,"as_of":"2027-01-01"}}"#,
        )
        .unwrap();
        assert_eq!(snap.events.len(), 3);
        assert_eq!(snap.events[0].category, Some(RawScalar::Int(39)));
        assert_eq!(snap.events[1].unit_id.as_ref().map(|u| u.to_string()).as_deref(), Some("42"));
        assert_eq!(snap.events[2].unit_id, None);
        assert!(matches!(snap.population_input(), PopulationInput::Counted(c) if c.total == 570));
    }

    #[test]
    fn odd_event_field_types_do_not_fail_the_load() {
        let snap = parse_snapshot(
            br#"{"events":[
                {"unit_id":"U1","timestamp":"2026-07-03"},
                {"unit_id":"U2","timestamp":1720000000},
                {"unit_id":4.5,"timestamp":"2026-07-03","category":true}
            ]}"#,
        )
        .unwrap();
        assert_eq!(snap.events.len(), 3);
        assert_eq!(snap.events[1].timestamp, Some(RawScalar::Int(1720000000)));
        assert_eq!(snap.events[2].unit_id.as_ref().and_then(RawScalar::as_text), None);
        assert_eq!(snap.events[2].category, Some(RawScalar::Other(Value::Bool(true))));
    }

    #[test]
    fn empty_object_is_no_data() {
        let snap = parse_snapshot(b"{}").unwrap();
        assert!(snap.events.is_empty());
        assert_eq!(snap.population_input(), PopulationInput::Absent);
    }

    #[test]
    fn units_and_population_are_exclusive() {
        let err = parse_snapshot(
            br#"{"units":[],"population":{"total":1}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, IoError::Invalid(_)));
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        assert!(matches!(parse_snapshot(br#"{"evnts":[]}"#), Err(IoError::Json { .. })));
    }

    #[test]
    fn load_hashes_raw_bytes_and_refuses_urls() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"events":[]}"#).unwrap();
        let loaded = load_snapshot(f.path()).unwrap();
        assert_eq!(loaded.sha256, sha256_hex(br#"{"events":[]}"#));

        let err = load_snapshot(Path::new("https://example.org/snap.json")).unwrap_err();
        assert!(matches!(err, IoError::Path(_)));
    }
}
