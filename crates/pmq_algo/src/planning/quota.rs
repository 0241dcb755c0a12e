//! Initial per-period plans: integer floor division plus remainder placement.
//!
//! - `base = floor(total / 6)`, `remainder = total mod 6`.
//! - `LeadingPeriods`: +1 to periods `0 .. remainder`. Ties favor earlier periods.
//! - `FinalPeriod`: the whole remainder lands on period 5.
//!
//! Either way Σ plans == total; nothing depends on unordered iteration.

use pmq_core::horizon::PERIOD_COUNT;
use pmq_core::variables::RemainderPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaAllocation {
    pub base: u64,
    pub remainder: u64,
    pub plans: [u64; PERIOD_COUNT],
}

impl QuotaAllocation {
    pub fn total(&self) -> u64 {
        self.plans.iter().sum()
    }
}

pub fn allocate_initial_plans(total: u64, policy: RemainderPolicy) -> QuotaAllocation {
    let n = PERIOD_COUNT as u64;
    let base = total / n;
    let remainder = total % n;

    let mut plans = [base; PERIOD_COUNT];
    match policy {
        RemainderPolicy::LeadingPeriods => {
            for plan in plans.iter_mut().take(remainder as usize) {
                *plan += 1;
            }
        }
        RemainderPolicy::FinalPeriod => {
            plans[PERIOD_COUNT - 1] += remainder;
        }
    }

    debug_assert_eq!(plans.iter().sum::<u64>(), total);
    QuotaAllocation { base, remainder, plans }
}
