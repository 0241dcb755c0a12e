// crates/pmq_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure quota math. No I/O, no logging, no clock: every input is passed in.

pub use pmq_core::{
    ids::UnitId,
    horizon::{Horizon, PeriodIndex, SubPeriodIndex, PERIOD_COUNT, SUB_PERIOD_COUNT},
};

// ----------------------------- Intake (events, population) ---------------------------

pub mod intake {
    pub mod dedup;
    pub mod population;

    pub use dedup::{deduplicate, Actuals, Dedup};
    pub use population::{baseline_roster, size_population, validate_cutoff, PopulationError};
}

// ----------------------------- Planning (plans per period) ---------------------------

pub mod planning {
    pub mod quota;
    pub mod reconcile;
    pub mod partition;

    pub use partition::{partition_period, partition_plan};
    pub use quota::{allocate_initial_plans, QuotaAllocation};
    pub use reconcile::{reconcile, ReconcileError, Reconciliation};
}

// ----------------------------- Scoring ----------------------------------------------

pub mod scoring;

// Convenience re-exports (pipeline imports these from crate root)
pub use intake::{
    baseline_roster, deduplicate, size_population, validate_cutoff, Actuals, Dedup,
    PopulationError,
};
pub use planning::{
    allocate_initial_plans, partition_period, partition_plan, reconcile, QuotaAllocation,
    ReconcileError, Reconciliation,
};
pub use scoring::{AchievementStatus, Score, ScoringPolicy};
