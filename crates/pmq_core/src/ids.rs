//! crates/pmq_core/src/ids.rs
//! Unit tokens and report ids. ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CoreError;

const HEX64_LEN: usize = 64;
const TOKEN_MAX_LEN: usize = 64;
const REPORT_PREFIX: &str = "RPT:";

/// Lowercase hex (length must be exactly 64).
#[inline]
pub fn is_valid_sha256(s: &str) -> bool {
    s.len() == HEX64_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Unit token: ^[A-Za-z0-9_.:/-]{1,64}$ (ASCII only).
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let len = s.len();
    if len == 0 || len > TOKEN_MAX_LEN {
        return false;
    }
    s.bytes().all(|b| {
        b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-' | b'/')
    })
}

/// Opaque identifier of a serviceable unit. Ordering is lexicographic, which
/// makes every `BTreeMap<UnitId, _>` in the engine iterate reproducibly.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UnitId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if is_valid_token(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(CoreError::InvalidToken(s.to_owned()))
        }
    }
}

impl<'de> Deserialize<'de> for UnitId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// "RPT:" + 64-hex (lowercase), derived from the canonical bytes of a report.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    /// Build from a raw digest. The digest must already be 64 lowercase hex.
    pub fn from_digest(hex64: &str) -> Result<Self, CoreError> {
        if is_valid_sha256(hex64) {
            Ok(Self(format!("{REPORT_PREFIX}{hex64}")))
        } else {
            Err(CoreError::InvalidId(hex64.to_owned()))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The digest part without the `RPT:` prefix.
    #[inline]
    pub fn digest(&self) -> &str {
        &self.0[REPORT_PREFIX.len()..]
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReportId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(REPORT_PREFIX)
            .ok_or_else(|| CoreError::InvalidId(s.to_owned()))?;
        Self::from_digest(rest)
    }
}

impl<'de> Deserialize<'de> for ReportId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
