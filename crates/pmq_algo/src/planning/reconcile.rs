//! Carry-forward variance reconciliation, walked strictly in period order.
//!
//! Period 0 keeps its initial plan. For period `i > 0`, with
//! `variance = actual[i-1] - adjusted[i-1]`:
//! - `NextPeriod`:      `adjusted[i] = max(0, initial[i] - variance)`.
//! - `SpreadRemaining`: `step = ceil(|variance| / (6 - i))` is taken off (over)
//!                      or added to (under) every period from `i` to the end;
//!                      `adjusted[i]` is the running plan clamped at 0.
//!
//! The variance of period 5 is reported, never propagated. Math is done in
//! i128 so no intermediate value can wrap.

use thiserror::Error;

use pmq_core::entities::PeriodQuota;
use pmq_core::horizon::{PeriodIndex, PERIOD_COUNT};
use pmq_core::variables::ReconcilePolicy;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A plan was still negative after clamping. Logic defect.
    #[error("negative plan invariant violated for {period}: computed {value}")]
    NegativePlanInvariantViolation { period: PeriodIndex, value: i128 },
    /// The carried-forward plan grew past what a `u64` count can hold.
    #[error("plan for {period} overflows a u64 count: computed {value}")]
    PlanOverflow { period: PeriodIndex, value: i128 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub periods: Vec<PeriodQuota>,
    /// Variance carried into each period (0 for period 0).
    pub carried: [i64; PERIOD_COUNT],
    /// Periods whose plan was raised to 0 by clamping.
    pub clamped: Vec<PeriodIndex>,
    pub terminal_variance: i64,
}

pub fn reconcile(
    initial: &[u64; PERIOD_COUNT],
    actual: &[u64; PERIOD_COUNT],
    policy: ReconcilePolicy,
) -> Result<Reconciliation, ReconcileError> {
    let mut running: [i128; PERIOD_COUNT] = initial.map(|p| p as i128);
    let mut adjusted = [0u64; PERIOD_COUNT];
    let mut carried = [0i64; PERIOD_COUNT];
    let mut clamped = Vec::new();

    adjusted[0] = initial[0];

    for p in PeriodIndex::all().skip(1) {
        let i = p.as_usize();
        let variance = actual[i - 1] as i128 - adjusted[i - 1] as i128;
        carried[i] = saturate_i64(variance);

        let raw = match policy {
            ReconcilePolicy::NextPeriod => initial[i] as i128 - variance,
            ReconcilePolicy::SpreadRemaining => {
                let remaining = p.remaining() as i128;
                let step = ceil_div_i128(variance.abs(), remaining);
                let delta = if variance > 0 { -step } else { step };
                for slot in running.iter_mut().skip(i) {
                    *slot += delta;
                }
                running[i]
            }
        };

        if raw < 0 {
            clamped.push(p);
        }
        adjusted[i] = to_plan(p, raw.max(0))?;
    }

    let last = PERIOD_COUNT - 1;
    let terminal_variance = saturate_i64(actual[last] as i128 - adjusted[last] as i128);

    let periods = PeriodIndex::all()
        .map(|p| {
            let i = p.as_usize();
            PeriodQuota {
                period: p,
                initial_plan: initial[i],
                adjusted_plan: adjusted[i],
                actual: actual[i],
            }
        })
        .collect();

    Ok(Reconciliation {
        periods,
        carried,
        clamped,
        terminal_variance,
    })
}

/// Narrow a clamped plan to a count. Negative input means clamping was skipped.
fn to_plan(period: PeriodIndex, value: i128) -> Result<u64, ReconcileError> {
    if value < 0 {
        return Err(ReconcileError::NegativePlanInvariantViolation { period, value });
    }
    u64::try_from(value).map_err(|_| ReconcileError::PlanOverflow { period, value })
}

#[inline]
fn ceil_div_i128(n: i128, d: i128) -> i128 {
    if d <= 0 {
        return 0;
    }
    (n + d - 1) / d
}

#[inline]
fn saturate_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjusted(r: &Reconciliation) -> Vec<u64> {
        r.periods.iter().map(|q| q.adjusted_plan).collect()
    }

    #[test]
    fn over_performance_next_period() {
        let r = reconcile(&[95; 6], &[119, 71, 95, 95, 95, 95], ReconcilePolicy::NextPeriod).unwrap();
        assert_eq!(r.carried[1], 24);
        assert_eq!(adjusted(&r), vec![95, 71, 95, 95, 95, 95]);
        assert_eq!(r.terminal_variance, 0);
        assert!(r.clamped.is_empty());
    }

    #[test]
    fn over_performance_spread_remaining() {
        let r = reconcile(&[95; 6], &[119, 90, 90, 90, 90, 90], ReconcilePolicy::SpreadRemaining)
            .unwrap();
        assert_eq!(adjusted(&r), vec![95, 90, 90, 90, 90, 90]);
        assert_eq!(r.carried[1], 24);
        assert_eq!(r.carried[2], 0);
    }

    #[test]
    fn under_performance_adds_back() {
        let r = reconcile(&[10; 6], &[4, 16, 10, 10, 10, 10], ReconcilePolicy::NextPeriod).unwrap();
        assert_eq!(adjusted(&r)[1], 16);
        assert_eq!(adjusted(&r)[2], 10);

        let r = reconcile(&[10; 6], &[4, 12, 12, 12, 12, 12], ReconcilePolicy::SpreadRemaining)
            .unwrap();
        // ceil(6 / 5) = 2 on every remaining period.
        assert_eq!(adjusted(&r), vec![10, 12, 12, 12, 12, 12]);
    }

    #[test]
    fn clamps_to_zero_and_reports() {
        let r = reconcile(&[3; 6], &[40, 0, 3, 3, 3, 3], ReconcilePolicy::NextPeriod).unwrap();
        assert_eq!(adjusted(&r)[1], 0);
        assert_eq!(r.clamped, vec![PeriodIndex::new(1).unwrap()]);
        assert_eq!(adjusted(&r)[2], 3);
    }

    #[test]
    fn terminal_variance_is_reported_not_propagated() {
        let r = reconcile(&[5; 6], &[5, 5, 5, 5, 5, 9], ReconcilePolicy::SpreadRemaining).unwrap();
        assert_eq!(adjusted(&r), vec![5; 6]);
        assert_eq!(r.terminal_variance, 4);
    }

    #[test]
    fn plan_narrowing_checks_both_ends() {
        let p = PeriodIndex::new(3).unwrap();
        assert_eq!(to_plan(p, 0), Ok(0));
        assert_eq!(to_plan(p, u64::MAX as i128), Ok(u64::MAX));
        assert_eq!(
            to_plan(p, -1),
            Err(ReconcileError::NegativePlanInvariantViolation { period: p, value: -1 })
        );
        assert!(matches!(
            to_plan(p, u64::MAX as i128 + 1),
            Err(ReconcileError::PlanOverflow { .. })
        ));
    }

    #[test]
    fn huge_shortfall_is_an_overflow_not_a_negative_plan() {
        let big = u64::MAX / 4;
        let err = reconcile(&[big; 6], &[0; 6], ReconcilePolicy::NextPeriod).unwrap_err();
        match err {
            ReconcileError::PlanOverflow { value, .. } => assert!(value > u64::MAX as i128),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn carried_plans_past_i64_keep_a_negative_variance() {
        let x = i64::MAX as u64 + 60;
        let r = reconcile(&[0, x, 0, 0, 0, 0], &[0; 6], ReconcilePolicy::NextPeriod).unwrap();
        assert_eq!(adjusted(&r), vec![0, x, x, x, x, x]);
        assert_eq!(r.periods[1].variance(), i64::MIN);
        assert_eq!(r.carried[2], i64::MIN);
        assert_eq!(r.terminal_variance, i64::MIN);
    }

    #[test]
    fn future_periods_with_no_actuals_carry_forward() {
        let r = reconcile(&[95; 6], &[119, 0, 0, 0, 0, 0], ReconcilePolicy::NextPeriod).unwrap();
        assert_eq!(adjusted(&r), vec![95, 71, 166, 261, 356, 451]);
        assert_eq!(r.terminal_variance, -451);
    }
}
