//! Split a period plan into four sub-period plans.
//!
//! `weekly = ceil(plan / 4)`; sub-periods 1..=3 take `min(weekly, left)`,
//! sub-period 4 takes whatever is left. Sums are exact, nothing goes negative,
//! and sub-period 4 never exceeds the others.

use pmq_core::entities::SubPeriodQuota;
use pmq_core::horizon::{PeriodIndex, SubPeriodIndex, SUB_PERIOD_COUNT};
use pmq_core::rounding::ceil_div;

pub fn partition_plan(plan: u64) -> [u64; SUB_PERIOD_COUNT] {
    let weekly = ceil_div(plan, SUB_PERIOD_COUNT as u64);
    let mut out = [0u64; SUB_PERIOD_COUNT];
    let mut left = plan;
    for slot in out.iter_mut().take(SUB_PERIOD_COUNT - 1) {
        let take = weekly.min(left);
        *slot = take;
        left -= take;
    }
    out[SUB_PERIOD_COUNT - 1] = left;
    out
}

/// Sub-period quotas for one period; actuals come from deduplication.
pub fn partition_period(
    period: PeriodIndex,
    plan: u64,
    actuals: [u64; SUB_PERIOD_COUNT],
) -> Vec<SubPeriodQuota> {
    let plans = partition_plan(plan);
    SubPeriodIndex::all()
        .map(|s| SubPeriodQuota {
            period,
            sub_index: s,
            plan: plans[s.slot()],
            actual: actuals[s.slot()],
        })
        .collect()
}
