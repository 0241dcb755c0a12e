//! Records and quota shapes shared by the algorithm and pipeline layers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::horizon::{PeriodIndex, SubPeriodIndex};
use crate::ids::UnitId;

/// A normalized "unit serviced" event. Raw input is read-only; timestamps are
/// expected in one consistent time reference before they reach this shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub unit_id: UnitId,
    pub timestamp: NaiveDateTime,
    pub category: String,
}

/// One row of the unit roster used to size the population.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitRecord {
    pub unit_id: UnitId,
    pub eligible: bool,
    pub updated_at: NaiveDateTime,
}

/// Count of eligible units at a cutoff. Fixed for the life of one report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Population {
    pub total: u64,
    pub as_of: NaiveDate,
}

/// Where a unit's first service event landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attribution {
    pub period: PeriodIndex,
    pub sub_period: SubPeriodIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuota {
    pub period: PeriodIndex,
    pub initial_plan: u64,
    pub adjusted_plan: u64,
    pub actual: u64,
}

impl PeriodQuota {
    /// Signed `actual - adjusted_plan`, saturated to the `i64` range.
    pub fn variance(&self) -> i64 {
        let v = self.actual as i128 - self.adjusted_plan as i128;
        v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPeriodQuota {
    pub period: PeriodIndex,
    pub sub_index: SubPeriodIndex,
    pub plan: u64,
    pub actual: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_quota_wire_shape_is_camel_case() {
        let q = PeriodQuota {
            period: PeriodIndex::new(2).unwrap(),
            initial_plan: 95,
            adjusted_plan: 90,
            actual: 97,
        };
        let v = serde_json::to_value(q).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"period": 2, "initialPlan": 95, "adjustedPlan": 90, "actual": 97})
        );
        assert_eq!(q.variance(), 7);
    }

    #[test]
    fn variance_keeps_its_sign_past_i64() {
        let q = PeriodQuota {
            period: PeriodIndex::LAST,
            initial_plan: 0,
            adjusted_plan: i64::MAX as u64 + 60,
            actual: 0,
        };
        assert_eq!(q.variance(), i64::MIN);
        let q = PeriodQuota { actual: u64::MAX, adjusted_plan: 0, ..q };
        assert_eq!(q.variance(), i64::MAX);
    }

    #[test]
    fn sub_period_index_rejects_out_of_range_on_decode() {
        let bad = serde_json::json!({"period": 0, "subIndex": 5, "plan": 1, "actual": 0});
        assert!(serde_json::from_value::<SubPeriodQuota>(bad).is_err());
    }
}
