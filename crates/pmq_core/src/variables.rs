//! Engine configuration: closed policy enums with explicit wire tokens, plus
//! the optional horizon/cutoff/category knobs and their domain checks.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::is_valid_token;

macro_rules! serde_enum {
    ($name:ident => { $($variant:ident = $token:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire token, identical to the serde rename.
            pub fn token(self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.token())
            }
        }

        impl core::str::FromStr for $name {
            type Err = VarsError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    other => Err(VarsError::UnknownToken {
                        key: stringify!($name),
                        token: other.to_owned(),
                    }),
                }
            }
        }
    };
}

/* ------------------------------ Policy enums ------------------------------ */

serde_enum!(ReconcilePolicy => {
    NextPeriod      = "next_period",
    SpreadRemaining = "spread_remaining"
});

serde_enum!(RemainderPolicy => {
    LeadingPeriods = "leading_periods",
    FinalPeriod    = "final_period"
});

serde_enum!(ZeroPlanPolicy => {
    Zero = "zero",
    Full = "full"
});

serde_enum!(AchievementCap => {
    Uncapped  = "uncapped",
    Capped100 = "capped_100"
});

impl Default for ReconcilePolicy {
    fn default() -> Self {
        ReconcilePolicy::SpreadRemaining
    }
}

impl Default for RemainderPolicy {
    fn default() -> Self {
        RemainderPolicy::LeadingPeriods
    }
}

impl Default for ZeroPlanPolicy {
    fn default() -> Self {
        ZeroPlanPolicy::Zero
    }
}

impl Default for AchievementCap {
    fn default() -> Self {
        AchievementCap::Uncapped
    }
}

/* ------------------------------ EngineConfig ------------------------------ */

/// Every key is optional on the wire and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub reconcile_policy: ReconcilePolicy,
    pub remainder_policy: RemainderPolicy,
    pub zero_plan_policy: ZeroPlanPolicy,
    pub achievement_cap: AchievementCap,

    /// Only events of this category count toward actuals when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_category: Option<String>,
    /// Overrides half-year anchoring. Must be the first of a month.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon_start: Option<NaiveDate>,
    /// Overrides the default cutoff (horizon end).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population_cutoff: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarsError {
    #[error("domain: {0}")]
    Domain(String),
    #[error("consistency: {0}")]
    Consistency(String),
    #[error("unknown {key} token: {token:?}")]
    UnknownToken { key: &'static str, token: String },
}

pub type VarsResult<T> = Result<T, VarsError>;

impl EngineConfig {
    /// Validate value domains and cross-field consistency.
    pub fn validate_domains(&self) -> VarsResult<()> {
        if let Some(cat) = &self.service_category {
            if !is_valid_token(cat) {
                return Err(VarsError::Domain(format!(
                    "service_category must match [A-Za-z0-9_.:/-]{{1,64}}, got {cat:?}"
                )));
            }
        }

        if let Some(start) = self.horizon_start {
            if start.day() != 1 {
                return Err(VarsError::Domain(format!(
                    "horizon_start must be the first of a month, got {start}"
                )));
            }
        }

        if let (Some(start), Some(cutoff)) = (self.horizon_start, self.population_cutoff) {
            if cutoff < start {
                return Err(VarsError::Consistency(format!(
                    "population_cutoff {cutoff} precedes horizon_start {start}"
                )));
            }
        }

        Ok(())
    }
}
