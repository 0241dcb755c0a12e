//! crates/pmq_pipeline/src/actuals.rs
//! ACTUALS stage: deduplicate normalized events into per-period and
//! per-sub-period actual counts.

use tracing::{debug, info};

use pmq_algo::{deduplicate, Actuals};
use pmq_core::entities::EventRecord;
use pmq_core::horizon::{Horizon, PeriodIndex};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActualsOutcome {
    pub actuals: Actuals,
    pub attributed_units: usize,
    pub duplicate_events: u64,
    pub outside_horizon: u64,
    pub filtered_category: u64,
}

pub fn compute_actuals(
    events: &[EventRecord],
    horizon: &Horizon,
    category: Option<&str>,
) -> ActualsOutcome {
    let dedup = deduplicate(events, horizon, category);
    let actuals = dedup.actuals();

    for p in PeriodIndex::all() {
        debug!(
            period = p.get(),
            actual = actuals.period(p),
            sub_periods = ?actuals.sub_periods_of(p),
            "period actuals"
        );
    }
    info!(
        units = dedup.attributed(),
        duplicates = dedup.duplicates,
        outside_horizon = dedup.outside_horizon,
        filtered_category = dedup.filtered_category,
        "events deduplicated"
    );

    ActualsOutcome {
        actuals,
        attributed_units: dedup.attributed(),
        duplicate_events: dedup.duplicates,
        outside_horizon: dedup.outside_horizon,
        filtered_category: dedup.filtered_category,
    }
}
