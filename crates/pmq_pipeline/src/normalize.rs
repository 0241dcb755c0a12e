//! crates/pmq_pipeline/src/normalize.rs
//! NORMALIZE stage: raw snapshot rows → typed records.
//!
//! Events that cannot be attributed (no unit id, no or unreadable timestamp)
//! are skipped and reported; they never fail the run. Unit rows feed the
//! population count, so a bad unit row is a hard input error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pmq_core::entities::{EventRecord, UnitRecord};
use pmq_core::ids::UnitId;
use pmq_io::snapshot::{RawEvent, RawScalar, RawUnit};

use crate::PipelineError;

/// Why an event was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedReason {
    #[serde(rename = "missing_unit_id")]
    MissingUnitId,
    #[serde(rename = "invalid_unit_id")]
    InvalidUnitId,
    #[serde(rename = "missing_timestamp")]
    MissingTimestamp,
    #[serde(rename = "invalid_timestamp")]
    InvalidTimestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedEvent {
    /// Position in the input `events` array.
    pub index: usize,
    pub reason: MalformedReason,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedEvents {
    pub events: Vec<EventRecord>,
    pub malformed: Vec<MalformedEvent>,
}

/// Accepts `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DD`
/// (midnight) and RFC 3339 with an offset (converted to UTC).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
}

/// Calendar date of any accepted timestamp form.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    parse_timestamp(s).map(|ts| ts.date())
}

fn event_record(ev: &RawEvent) -> Result<EventRecord, MalformedReason> {
    let raw_id = match &ev.unit_id {
        Some(id) => id.as_text().ok_or(MalformedReason::InvalidUnitId)?,
        None => return Err(MalformedReason::MissingUnitId),
    };
    if raw_id.trim().is_empty() {
        return Err(MalformedReason::MissingUnitId);
    }
    let unit_id: UnitId = raw_id.parse().map_err(|_| MalformedReason::InvalidUnitId)?;

    let raw_ts = match &ev.timestamp {
        None => return Err(MalformedReason::MissingTimestamp),
        Some(RawScalar::Text(t)) if t.trim().is_empty() => {
            return Err(MalformedReason::MissingTimestamp)
        }
        Some(RawScalar::Text(t)) => t.as_str(),
        // Epoch numbers are not an accepted form.
        Some(_) => return Err(MalformedReason::InvalidTimestamp),
    };
    let timestamp = parse_timestamp(raw_ts).ok_or(MalformedReason::InvalidTimestamp)?;

    Ok(EventRecord {
        unit_id,
        timestamp,
        category: ev
            .category
            .as_ref()
            .and_then(RawScalar::as_text)
            .unwrap_or_default(),
    })
}

pub fn normalize_events(raw: &[RawEvent]) -> NormalizedEvents {
    let mut out = NormalizedEvents {
        events: Vec::with_capacity(raw.len()),
        malformed: Vec::new(),
    };
    for (index, ev) in raw.iter().enumerate() {
        match event_record(ev) {
            Ok(rec) => out.events.push(rec),
            Err(reason) => {
                warn!(index, ?reason, "skipping malformed event");
                out.malformed.push(MalformedEvent { index, reason });
            }
        }
    }
    info!(
        accepted = out.events.len(),
        malformed = out.malformed.len(),
        "events normalized"
    );
    out
}

pub fn normalize_units(raw: &[RawUnit]) -> Result<Vec<UnitRecord>, PipelineError> {
    raw.iter()
        .enumerate()
        .map(|(i, u)| {
            let raw_id = u.unit_id.as_text().ok_or_else(|| {
                PipelineError::Input(format!("units[{i}].unit_id: not a string or integer"))
            })?;
            let unit_id: UnitId = raw_id
                .parse()
                .map_err(|e| PipelineError::Input(format!("units[{i}].unit_id: {e}")))?;
            let updated_at = parse_timestamp(&u.updated_at).ok_or_else(|| {
                PipelineError::Input(format!(
                    "units[{i}].updated_at: unreadable timestamp {:?}",
                    u.updated_at
                ))
            })?;
            Ok(UnitRecord {
                unit_id,
                eligible: u.eligible,
                updated_at,
            })
        })
        .collect()
}
