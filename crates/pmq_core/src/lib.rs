//! pmq_core: core types, horizon calendar, policy domains, integer rounding.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! engine (`pmq_algo`, `pmq_io`, `pmq_pipeline`, `pmq_report`, `pmq_cli`).
//!
//! - Tokens & ids: `UnitId`, `ReportId` (`RPT:` + 64-hex)
//! - Calendar: `Horizon` (6 periods × 4 sub-periods), `PeriodIndex`, `SubPeriodIndex`
//! - Clock injection: `Clock`, `FixedClock`, `SystemClock`
//! - Records & quotas: `EventRecord`, `UnitRecord`, `Population`, `PeriodQuota`, `SubPeriodQuota`
//! - Policy domains: `EngineConfig` with its closed policy enums
//! - Integer-first rounding helpers

#![forbid(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod horizon;
pub mod entities;
pub mod rounding;
pub mod variables;

pub use errors::CoreError;
pub use ids::{ReportId, UnitId};
pub use horizon::{
    Clock, FixedClock, Horizon, PeriodIndex, SubPeriodIndex, SystemClock, PERIOD_COUNT,
    SUB_PERIOD_COUNT,
};
pub use entities::{Attribution, EventRecord, PeriodQuota, Population, SubPeriodQuota, UnitRecord};
pub use variables::{
    AchievementCap, EngineConfig, ReconcilePolicy, RemainderPolicy, VarsError, ZeroPlanPolicy,
};
