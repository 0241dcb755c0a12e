//! Integer-first rounding. No floats anywhere in quota math.

/// `ceil(n / d)` for `d > 0`. Returns 0 when `d == 0`.
#[inline]
pub fn ceil_div(n: u64, d: u64) -> u64 {
    if d == 0 {
        return 0;
    }
    n / d + u64::from(n % d != 0)
}

/// `round(100 * actual / plan)` with half-up rounding, computed in u128.
/// Caller handles `plan == 0`; this returns `None` for it.
pub fn percent_half_up(actual: u64, plan: u64) -> Option<u64> {
    if plan == 0 {
        return None;
    }
    let num = 200u128 * actual as u128 + plan as u128;
    let den = 2u128 * plan as u128;
    u64::try_from(num / den).ok()
}
