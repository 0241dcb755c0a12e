//! crates/pmq_pipeline/src/build_report.rs
//! BUILD_REPORT stage: assemble the `QuotaReport` document and derive its id.
//!
//! The id is `RPT:` + SHA-256 of the canonical JSON of the report body (every
//! field except `id`), so identical inputs and config give identical ids.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pmq_algo::{partition_period, AchievementStatus, ScoringPolicy};
use pmq_core::horizon::{Horizon, PeriodIndex, SubPeriodIndex};
use pmq_core::ids::{ReportId, UnitId};
use pmq_core::variables::{
    AchievementCap, EngineConfig, ReconcilePolicy, RemainderPolicy, ZeroPlanPolicy,
};
use pmq_io::hasher::report_id_for;

use crate::actuals::ActualsOutcome;
use crate::normalize::MalformedEvent;
use crate::plan::{PlanOutcome, Sizing};
use crate::PipelineError;

// ---------------------------------- Document ----------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaReport {
    pub id: ReportId,
    #[serde(flatten)]
    pub body: ReportBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    pub horizon: HorizonBlock,
    pub totals: TotalsBlock,
    pub periods: Vec<PeriodBlock>,
    pub policies: PoliciesBlock,
    pub diagnostics: DiagnosticsBlock,
    pub baseline_roster: Vec<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonBlock {
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_period: Option<PeriodIndex>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsBlock {
    pub total_population: u64,
    pub base_plan: u64,
    pub remainder: u64,
    pub population_as_of: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBlock {
    pub period: PeriodIndex,
    /// `YYYY-MM` of the calendar month.
    pub month: String,
    pub initial_plan: u64,
    pub adjusted_plan: u64,
    pub actual: u64,
    pub variance: i64,
    pub achievement_pct: u64,
    pub status: AchievementStatus,
    pub sub_periods: Vec<SubPeriodBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPeriodBlock {
    pub index: SubPeriodIndex,
    pub plan: u64,
    pub actual: u64,
    pub achievement_pct: u64,
    pub status: AchievementStatus,
}

/// Effective policies, echoed so every number can be reproduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliciesBlock {
    pub reconcile_policy: ReconcilePolicy,
    pub remainder_policy: RemainderPolicy,
    pub zero_plan_policy: ZeroPlanPolicy,
    pub achievement_cap: AchievementCap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_category: Option<String>,
}

impl From<&EngineConfig> for PoliciesBlock {
    fn from(c: &EngineConfig) -> Self {
        Self {
            reconcile_policy: c.reconcile_policy,
            remainder_policy: c.remainder_policy,
            zero_plan_policy: c.zero_plan_policy,
            achievement_cap: c.achievement_cap,
            service_category: c.service_category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsBlock {
    pub malformed_events: Vec<MalformedEvent>,
    pub malformed_count: u64,
    pub duplicate_events: u64,
    pub outside_horizon: u64,
    pub filtered_category: u64,
    pub clamped_periods: Vec<PeriodIndex>,
    pub terminal_variance: i64,
}

// ---------------------------------- Assembly ----------------------------------

pub struct ReportInputs<'a> {
    pub horizon: &'a Horizon,
    pub reference_date: NaiveDate,
    pub config: &'a EngineConfig,
    pub sizing: Sizing,
    pub actuals: &'a ActualsOutcome,
    pub plan: &'a PlanOutcome,
    pub malformed: Vec<MalformedEvent>,
    pub input_sha256: Option<String>,
}

pub fn build_report(inp: ReportInputs<'_>) -> Result<QuotaReport, PipelineError> {
    let scoring = ScoringPolicy::new(inp.config.zero_plan_policy, inp.config.achievement_cap);
    let rec = &inp.plan.reconciliation;

    let periods = rec
        .periods
        .iter()
        .map(|q| {
            let score = scoring.score(q.adjusted_plan, q.actual);
            let sub_periods = partition_period(
                q.period,
                q.adjusted_plan,
                inp.actuals.actuals.sub_periods_of(q.period),
            )
            .into_iter()
            .map(|s| {
                let sub_score = scoring.score(s.plan, s.actual);
                SubPeriodBlock {
                    index: s.sub_index,
                    plan: s.plan,
                    actual: s.actual,
                    achievement_pct: sub_score.pct,
                    status: sub_score.status,
                }
            })
            .collect();

            PeriodBlock {
                period: q.period,
                month: inp.horizon.period_start(q.period).format("%Y-%m").to_string(),
                initial_plan: q.initial_plan,
                adjusted_plan: q.adjusted_plan,
                actual: q.actual,
                variance: q.variance(),
                achievement_pct: score.pct,
                status: score.status,
                sub_periods,
            }
        })
        .collect();

    let body = ReportBody {
        horizon: HorizonBlock {
            start: inp.horizon.start(),
            end: inp.horizon.end(),
            current_period: inp.horizon.current_period(inp.reference_date),
        },
        totals: TotalsBlock {
            total_population: inp.sizing.population.total,
            base_plan: inp.plan.allocation.base,
            remainder: inp.plan.allocation.remainder,
            population_as_of: inp.sizing.population.as_of,
        },
        periods,
        policies: PoliciesBlock::from(inp.config),
        diagnostics: DiagnosticsBlock {
            malformed_count: inp.malformed.len() as u64,
            malformed_events: inp.malformed,
            duplicate_events: inp.actuals.duplicate_events,
            outside_horizon: inp.actuals.outside_horizon,
            filtered_category: inp.actuals.filtered_category,
            clamped_periods: rec.clamped.clone(),
            terminal_variance: rec.terminal_variance,
        },
        baseline_roster: inp.sizing.baseline_roster,
        input_sha256: inp.input_sha256,
    };

    let value = serde_json::to_value(&body).map_err(|e| PipelineError::Build(e.to_string()))?;
    let id = report_id_for(&value).map_err(|e| PipelineError::Build(e.to_string()))?;
    Ok(QuotaReport { id, body })
}

impl QuotaReport {
    pub fn to_value(&self) -> Result<serde_json::Value, PipelineError> {
        serde_json::to_value(self).map_err(|e| PipelineError::Build(e.to_string()))
    }

    pub fn period(&self, p: u8) -> Option<&PeriodBlock> {
        self.body.periods.iter().find(|b| b.period.get() == p)
    }
}
