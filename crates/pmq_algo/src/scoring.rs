//! Achievement percentage from a (plan, actual) pair.

use serde::{Deserialize, Serialize};

use pmq_core::rounding::percent_half_up;
use pmq_core::variables::{AchievementCap, ZeroPlanPolicy};

const FULL: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AchievementStatus {
    #[serde(rename = "met")]
    Met,
    #[serde(rename = "behind")]
    Behind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub pct: u64,
    pub status: AchievementStatus,
}

/// Zero-plan handling and clamping, both explicit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoringPolicy {
    pub zero_plan: ZeroPlanPolicy,
    pub cap: AchievementCap,
}

impl ScoringPolicy {
    pub fn new(zero_plan: ZeroPlanPolicy, cap: AchievementCap) -> Self {
        Self { zero_plan, cap }
    }

    /// `round(100 * actual / plan)`, half up. Saturates instead of wrapping.
    pub fn percent(&self, plan: u64, actual: u64) -> u64 {
        let raw = if plan == 0 {
            match self.zero_plan {
                ZeroPlanPolicy::Zero => 0,
                ZeroPlanPolicy::Full => FULL,
            }
        } else {
            percent_half_up(actual, plan).unwrap_or(u64::MAX)
        };
        match self.cap {
            AchievementCap::Uncapped => raw,
            AchievementCap::Capped100 => raw.min(FULL),
        }
    }

    pub fn score(&self, plan: u64, actual: u64) -> Score {
        let pct = self.percent(plan, actual);
        let status = if pct >= FULL {
            AchievementStatus::Met
        } else {
            AchievementStatus::Behind
        };
        Score { pct, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_plan_follows_policy() {
        let zero = ScoringPolicy::new(ZeroPlanPolicy::Zero, AchievementCap::Uncapped);
        let full = ScoringPolicy::new(ZeroPlanPolicy::Full, AchievementCap::Uncapped);
        assert_eq!(zero.percent(0, 0), 0);
        assert_eq!(full.percent(0, 0), 100);
        assert_eq!(full.score(0, 0).status, AchievementStatus::Met);
    }

    #[test]
    fn cap_follows_policy() {
        let uncapped = ScoringPolicy::new(ZeroPlanPolicy::Zero, AchievementCap::Uncapped);
        let capped = ScoringPolicy::new(ZeroPlanPolicy::Zero, AchievementCap::Capped100);
        assert_eq!(uncapped.percent(100, 150), 150);
        assert_eq!(capped.percent(100, 150), 100);
    }

    #[test]
    fn plan_without_progress_is_zero_and_behind() {
        let s = ScoringPolicy::default().score(24, 0);
        assert_eq!(s, Score { pct: 0, status: AchievementStatus::Behind });
    }

    #[test]
    fn rounding_is_half_up() {
        let p = ScoringPolicy::default();
        assert_eq!(p.percent(8, 1), 13);
        assert_eq!(p.percent(95, 94), 99);
        assert_eq!(p.score(95, 95).status, AchievementStatus::Met);
    }

    #[test]
    fn status_token_shape() {
        assert_eq!(serde_json::to_value(AchievementStatus::Behind).unwrap(), "behind");
    }
}
