//! Minimal error set for core-domain validation & parsing.

use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid token: {0:?}")]
    InvalidToken(String),
    #[error("invalid id: {0:?}")]
    InvalidId(String),
    #[error("period index out of range: {0} (expected 0..=5)")]
    PeriodOutOfRange(u8),
    #[error("sub-period index out of range: {0} (expected 1..=4)")]
    SubPeriodOutOfRange(u8),
    #[error("horizon must start on the first day of a month, got {0}")]
    HorizonNotMonthStart(chrono::NaiveDate),
    #[error("date arithmetic overflow")]
    DateOverflow,
}
