//! pmq_pipeline: deterministic pipeline surface
//! (normalize → dedup → size → allocate → reconcile → partition → score → build).
//!
//! This crate stays I/O-free: snapshots arrive already loaded by `pmq_io`, the
//! math lives in `pmq_algo`, and the reference date is passed in explicitly.

#![forbid(unsafe_code)]

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use pmq_core::errors::CoreError;
use pmq_core::horizon::Clock;
use pmq_core::variables::EngineConfig;
use pmq_io::snapshot::{PopulationInput, RawSnapshot};

pub mod actuals;
pub mod build_report;
pub mod normalize;
pub mod plan;

pub use build_report::{
    DiagnosticsBlock, HorizonBlock, PeriodBlock, PoliciesBlock, QuotaReport, ReportBody,
    SubPeriodBlock, TotalsBlock,
};
pub use normalize::{MalformedEvent, MalformedReason};

/// Single error surface for the pipeline orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Snapshot content that cannot be used (bad unit rows, unreadable dates).
    #[error("input: {0}")]
    Input(String),

    #[error("horizon: {0}")]
    Horizon(#[from] CoreError),

    #[error(transparent)]
    InvalidCutoff(#[from] pmq_algo::PopulationError),

    #[error("invariant: {0}")]
    Invariant(#[from] pmq_algo::ReconcileError),

    #[error("build: {0}")]
    Build(String),
}

/// Everything one run needs. Nothing here is read from the environment.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    pub snapshot: RawSnapshot,
    /// Digest of the raw snapshot bytes, when loaded from a file.
    pub input_sha256: Option<String>,
    pub config: EngineConfig,
    pub reference_date: NaiveDate,
}

impl PipelineCtx {
    pub fn new(snapshot: RawSnapshot, config: EngineConfig, clock: &dyn Clock) -> Self {
        Self {
            snapshot,
            input_sha256: None,
            config,
            reference_date: clock.today(),
        }
    }

    pub fn with_input_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.input_sha256 = Some(sha256.into());
        self
    }
}

/// Counts from a dry validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSummary {
    pub events: usize,
    pub malformed_events: usize,
    pub units: Option<usize>,
    pub counted_total: Option<u64>,
}

/// Check config, horizon, unit rows and cutoff without building a report.
pub fn validate_inputs(ctx: &PipelineCtx) -> Result<InputSummary, PipelineError> {
    ctx.config
        .validate_domains()
        .map_err(|e| PipelineError::Input(format!("config: {e}")))?;
    let horizon = plan::resolve_horizon(&ctx.config, ctx.reference_date)?;
    let sizing = plan::size(&ctx.snapshot, &ctx.config, &horizon)?;
    let normalized = normalize::normalize_events(&ctx.snapshot.events);

    let (units, counted_total) = match ctx.snapshot.population_input() {
        PopulationInput::Units(u) => (Some(u.len()), None),
        PopulationInput::Counted(_) => (None, Some(sizing.population.total)),
        PopulationInput::Absent => (None, None),
    };
    Ok(InputSummary {
        events: normalized.events.len(),
        malformed_events: normalized.malformed.len(),
        units,
        counted_total,
    })
}

/// Run the whole pipeline on a loaded context.
pub fn run_with_ctx(ctx: &PipelineCtx) -> Result<QuotaReport, PipelineError> {
    ctx.config
        .validate_domains()
        .map_err(|e| PipelineError::Input(format!("config: {e}")))?;

    // --- NORMALIZE ---
    let normalized = normalize::normalize_events(&ctx.snapshot.events);

    // --- HORIZON + SIZE ---
    let horizon = plan::resolve_horizon(&ctx.config, ctx.reference_date)?;
    let sizing = plan::size(&ctx.snapshot, &ctx.config, &horizon)?;

    // --- ACTUALS (dedup) ---
    let actuals = actuals::compute_actuals(
        &normalized.events,
        &horizon,
        ctx.config.service_category.as_deref(),
    );

    // --- ALLOCATE + RECONCILE ---
    let planned = plan::plan(sizing.population.total, &actuals.actuals, &ctx.config)?;

    // --- PARTITION + SCORE + BUILD ---
    let report = build_report::build_report(build_report::ReportInputs {
        horizon: &horizon,
        reference_date: ctx.reference_date,
        config: &ctx.config,
        sizing,
        actuals: &actuals,
        plan: &planned,
        malformed: normalized.malformed,
        input_sha256: ctx.input_sha256.clone(),
    })?;

    info!(id = %report.id, "report built");
    Ok(report)
}
