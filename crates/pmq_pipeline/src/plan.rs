//! crates/pmq_pipeline/src/plan.rs
//! PLAN stage: resolve the horizon, size the population, allocate initial
//! plans, reconcile them against actuals in period order.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use pmq_algo::{
    allocate_initial_plans, baseline_roster, reconcile, size_population, validate_cutoff, Actuals,
    QuotaAllocation, Reconciliation,
};
use pmq_core::entities::Population;
use pmq_core::horizon::Horizon;
use pmq_core::ids::UnitId;
use pmq_core::variables::EngineConfig;
use pmq_io::snapshot::{PopulationInput, RawSnapshot};

use crate::normalize::{normalize_units, parse_date};
use crate::PipelineError;

/// Explicit `horizon_start` wins; otherwise the half-year containing `reference`.
pub fn resolve_horizon(config: &EngineConfig, reference: NaiveDate) -> Result<Horizon, PipelineError> {
    let horizon = match config.horizon_start {
        Some(start) => Horizon::starting_at(start)?,
        None => Horizon::containing(reference)?,
    };
    debug!(start = %horizon.start(), end = %horizon.end(), "horizon resolved");
    Ok(horizon)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sizing {
    pub population: Population,
    /// Empty unless the population was sized from a unit list.
    pub baseline_roster: Vec<UnitId>,
}

/// Count the population once; it stays fixed for the rest of the run.
pub fn size(
    snapshot: &RawSnapshot,
    config: &EngineConfig,
    horizon: &Horizon,
) -> Result<Sizing, PipelineError> {
    let default_cutoff = config.population_cutoff.unwrap_or_else(|| horizon.end());

    let sizing = match snapshot.population_input() {
        PopulationInput::Units(raw) => {
            let units = normalize_units(raw)?;
            let population = size_population(&units, default_cutoff, horizon)?;
            Sizing {
                population,
                baseline_roster: baseline_roster(&units, horizon),
            }
        }
        PopulationInput::Counted(c) => {
            let as_of = match c.as_of.as_deref() {
                Some(s) => parse_date(s).ok_or_else(|| {
                    PipelineError::Input(format!("population.as_of: unreadable date {s:?}"))
                })?,
                None => default_cutoff,
            };
            validate_cutoff(as_of, horizon)?;
            Sizing {
                population: Population { total: c.total, as_of },
                baseline_roster: Vec::new(),
            }
        }
        PopulationInput::Absent => {
            validate_cutoff(default_cutoff, horizon)?;
            warn!("snapshot carries no population; sizing as zero");
            Sizing {
                population: Population { total: 0, as_of: default_cutoff },
                baseline_roster: Vec::new(),
            }
        }
    };

    info!(
        total = sizing.population.total,
        as_of = %sizing.population.as_of,
        roster = sizing.baseline_roster.len(),
        "population sized"
    );
    Ok(sizing)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanOutcome {
    pub allocation: QuotaAllocation,
    pub reconciliation: Reconciliation,
}

pub fn plan(total: u64, actuals: &Actuals, config: &EngineConfig) -> Result<PlanOutcome, PipelineError> {
    let allocation = allocate_initial_plans(total, config.remainder_policy);
    info!(
        base = allocation.base,
        remainder = allocation.remainder,
        policy = %config.remainder_policy,
        "initial plans allocated"
    );

    let reconciliation = reconcile(&allocation.plans, &actuals.periods, config.reconcile_policy)?;
    for (i, q) in reconciliation.periods.iter().enumerate() {
        debug!(
            period = i,
            initial = q.initial_plan,
            adjusted = q.adjusted_plan,
            actual = q.actual,
            carried = reconciliation.carried[i],
            "period reconciled"
        );
    }
    for p in &reconciliation.clamped {
        warn!(period = p.get(), "adjusted plan clamped to zero");
    }
    info!(
        policy = %config.reconcile_policy,
        terminal_variance = reconciliation.terminal_variance,
        "plans reconciled"
    );

    Ok(PlanOutcome {
        allocation,
        reconciliation,
    })
}
