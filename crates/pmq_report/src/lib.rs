//! pmq_report: pure offline report model + renderers (JSON / plain text).
//!
//! Determinism rules:
//! - No I/O here. Callers pass the quota report already in memory.
//! - Nothing is recomputed; every number is read from the report document.
//! - Percent and variance strings are formatted from integers only.
//!
//! The input is the report as a `serde_json::Value` so this crate does not
//! depend on the pipeline's concrete types.

#![deny(unsafe_code)]

use serde_json::Value;
use thiserror::Error;

#[cfg(feature = "render_text")]
mod render_text;
#[cfg(feature = "render_text")]
pub use render_text::render_text;

/// The canonical `quota_report.json` document, loosely coupled.
pub type QuotaReportArtifact = Value;

// ===== Errors =====
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("inconsistent report: {0}")]
    Inconsistent(&'static str),
    #[error("render: {0}")]
    Render(String),
}

// ===== Model =====
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportModel {
    pub header: SectionHeader,
    pub totals: SectionTotals,
    pub periods: Vec<PeriodRow>,
    pub policies: Vec<PolicyItem>,
    pub diagnostics: SectionDiagnostics,
    pub integrity: SectionIntegrity,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeader {
    pub title: String,
    pub horizon_start: String,
    pub horizon_end: String,
    /// `P1`..`P6`, absent when the reference date lies outside the horizon.
    pub current_period: Option<String>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionTotals {
    pub total_population: u64,
    pub population_as_of: String,
    pub base_plan: u64,
    pub remainder: u64,
    pub planned: u64,
    pub actual: u64,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodRow {
    pub label: String,
    pub month: String,
    pub initial_plan: u64,
    pub adjusted_plan: u64,
    pub actual: u64,
    /// Signed, e.g. `+24`, `-3`, `0`.
    pub variance: String,
    /// e.g. `126%`.
    pub achievement: String,
    pub status: String,
    pub current: bool,
    pub sub_periods: Vec<SubPeriodRow>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubPeriodRow {
    pub label: String,
    pub plan: u64,
    pub actual: u64,
    pub achievement: String,
    pub status: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyItem {
    pub key: String,
    pub value: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionDiagnostics {
    pub malformed_count: u64,
    /// `#index: reason` for each skipped event.
    pub malformed: Vec<String>,
    pub duplicate_events: u64,
    pub outside_horizon: u64,
    pub filtered_category: u64,
    pub clamped_periods: Vec<String>,
    pub terminal_variance: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionIntegrity {
    pub report_id: String,
    pub input_sha256: Option<String>,
    pub baseline_roster_size: u64,
}

impl ReportModel {
    pub fn current(&self) -> Option<&PeriodRow> {
        self.periods.iter().find(|p| p.current)
    }
}

// ===== API =====

/// Build the report model from a quota report document (pure, offline).
///
/// Required fields missing from the document yield `ReportError::MissingField`.
pub fn build_model(report: &QuotaReportArtifact) -> Result<ReportModel, ReportError> {
    let report_id = json_get_str(report, "/id")?;
    if !report_id.starts_with("RPT:") {
        return Err(ReportError::Inconsistent("id must start with RPT:"));
    }

    // ---- Header ----
    let current_idx = report.pointer("/horizon/currentPeriod").and_then(Value::as_u64);
    let header = SectionHeader {
        title: "Preventive-Maintenance Quota Report".to_string(),
        horizon_start: json_get_str(report, "/horizon/start")?,
        horizon_end: json_get_str(report, "/horizon/end")?,
        current_period: current_idx.map(period_label),
    };

    // ---- Periods ----
    let raw_periods = report
        .pointer("/periods")
        .and_then(Value::as_array)
        .ok_or_else(|| ReportError::MissingField("/periods".into()))?;
    if raw_periods.len() != 6 {
        return Err(ReportError::Inconsistent("periods must have 6 entries"));
    }
    let periods = raw_periods
        .iter()
        .map(|p| period_row(p, current_idx))
        .collect::<Result<Vec<_>, _>>()?;

    // ---- Totals ----
    let totals = SectionTotals {
        total_population: json_get_u64(report, "/totals/totalPopulation")?,
        population_as_of: json_get_str(report, "/totals/populationAsOf")?,
        base_plan: json_get_u64(report, "/totals/basePlan")?,
        remainder: json_get_u64(report, "/totals/remainder")?,
        planned: periods.iter().map(|p| p.initial_plan).sum(),
        actual: periods.iter().map(|p| p.actual).sum(),
    };

    // ---- Policies (echo, stable key order) ----
    let mut policies = Vec::new();
    for key in [
        "reconcilePolicy",
        "remainderPolicy",
        "zeroPlanPolicy",
        "achievementCap",
        "serviceCategory",
    ] {
        if let Some(v) = report.pointer(&format!("/policies/{key}")) {
            policies.push(PolicyItem {
                key: key.to_string(),
                value: cell_to_string(v),
            });
        }
    }

    // ---- Diagnostics ----
    let malformed = report
        .pointer("/diagnostics/malformedEvents")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|m| {
                    let index = m.get("index").map(cell_to_string).unwrap_or_default();
                    let reason = m.get("reason").map(cell_to_string).unwrap_or_default();
                    format!("#{index}: {reason}")
                })
                .collect()
        })
        .unwrap_or_default();
    let clamped_periods = report
        .pointer("/diagnostics/clampedPeriods")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_u64).map(period_label).collect())
        .unwrap_or_default();
    let diagnostics = SectionDiagnostics {
        malformed_count: json_get_u64(report, "/diagnostics/malformedCount")?,
        malformed,
        duplicate_events: json_get_u64(report, "/diagnostics/duplicateEvents").unwrap_or(0),
        outside_horizon: json_get_u64(report, "/diagnostics/outsideHorizon").unwrap_or(0),
        filtered_category: json_get_u64(report, "/diagnostics/filteredCategory").unwrap_or(0),
        clamped_periods,
        terminal_variance: signed(json_get_i64(report, "/diagnostics/terminalVariance").unwrap_or(0)),
    };

    // ---- Integrity ----
    let integrity = SectionIntegrity {
        report_id,
        input_sha256: json_get_str(report, "/inputSha256").ok(),
        baseline_roster_size: report
            .pointer("/baselineRoster")
            .and_then(Value::as_array)
            .map_or(0, |a| a.len() as u64),
    };

    Ok(ReportModel {
        header,
        totals,
        periods,
        policies,
        diagnostics,
        integrity,
    })
}

fn period_row(p: &Value, current_idx: Option<u64>) -> Result<PeriodRow, ReportError> {
    let idx = json_get_u64(p, "/period")?;
    let sub_periods = p
        .pointer("/subPeriods")
        .and_then(Value::as_array)
        .ok_or_else(|| ReportError::MissingField("/periods/*/subPeriods".into()))?
        .iter()
        .map(|s| {
            Ok(SubPeriodRow {
                label: format!("W{}", json_get_u64(s, "/index")?),
                plan: json_get_u64(s, "/plan")?,
                actual: json_get_u64(s, "/actual")?,
                achievement: format!("{}%", json_get_u64(s, "/achievementPct")?),
                status: json_get_str(s, "/status")?,
            })
        })
        .collect::<Result<Vec<_>, ReportError>>()?;

    Ok(PeriodRow {
        label: period_label(idx),
        month: json_get_str(p, "/month")?,
        initial_plan: json_get_u64(p, "/initialPlan")?,
        adjusted_plan: json_get_u64(p, "/adjustedPlan")?,
        actual: json_get_u64(p, "/actual")?,
        variance: signed(json_get_i64(p, "/variance")?),
        achievement: format!("{}%", json_get_u64(p, "/achievementPct")?),
        status: json_get_str(p, "/status")?,
        current: current_idx == Some(idx),
        sub_periods,
    })
}

// ===== Renderers =====

/// Serialize the model as pretty JSON (field order follows struct layout).
#[cfg(feature = "render_json")]
pub fn render_json(model: &ReportModel) -> Result<String, ReportError> {
    serde_json::to_string_pretty(model).map_err(|e| ReportError::Render(e.to_string()))
}

// ===== Helpers (pure; no floats) =====

fn period_label(idx: u64) -> String {
    format!("P{}", idx + 1)
}

fn signed(v: i64) -> String {
    if v > 0 {
        format!("+{v}")
    } else {
        v.to_string()
    }
}

fn cell_to_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_get_str(root: &Value, ptr: &str) -> Result<String, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ReportError::MissingField(ptr.to_string()))
}

fn json_get_u64(root: &Value, ptr: &str) -> Result<u64, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_u64)
        .ok_or_else(|| ReportError::MissingField(ptr.to_string()))
}

fn json_get_i64(root: &Value, ptr: &str) -> Result<i64, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_i64)
        .ok_or_else(|| ReportError::MissingField(ptr.to_string()))
}

#[cfg(test)]
pub(crate) mod fixture {
    use serde_json::{json, Value};

    fn period(i: u64, month: &str, initial: u64, adjusted: u64, actual: u64) -> Value {
        let pct = if adjusted == 0 { 0 } else { (200 * actual + adjusted) / (2 * adjusted) };
        json!({
            "period": i,
            "month": month,
            "initialPlan": initial,
            "adjustedPlan": adjusted,
            "actual": actual,
            "variance": actual as i64 - adjusted as i64,
            "achievementPct": pct,
            "status": if pct >= 100 { "met" } else { "behind" },
            "subPeriods": (1..=4).map(|w| json!({
                "index": w, "plan": adjusted / 4, "actual": if w == 1 { actual } else { 0 },
                "achievementPct": 0, "status": "behind"
            })).collect::<Vec<_>>()
        })
    }

    pub fn report() -> Value {
        json!({
            "id": "RPT:0000000000000000000000000000000000000000000000000000000000000000",
            "horizon": {"start": "2026-07-01", "end": "2027-01-01", "currentPeriod": 1},
            "totals": {"totalPopulation": 570, "basePlan": 95, "remainder": 0,
                       "populationAsOf": "2027-01-01"},
            "periods": [
                period(0, "2026-07", 95, 95, 119),
                period(1, "2026-08", 95, 90, 12),
                period(2, "2026-09", 95, 90, 0),
                period(3, "2026-10", 95, 90, 0),
                period(4, "2026-11", 95, 90, 0),
                period(5, "2026-12", 95, 90, 0)
            ],
            "policies": {"reconcilePolicy": "spread_remaining", "remainderPolicy": "leading_periods",
                         "zeroPlanPolicy": "zero", "achievementCap": "uncapped"},
            "diagnostics": {"malformedEvents": [{"index": 4, "reason": "missing_unit_id"}],
                            "malformedCount": 1, "duplicateEvents": 2, "outsideHorizon": 0,
                            "filteredCategory": 3, "clampedPeriods": [], "terminalVariance": -90},
            "baselineRoster": ["A-1", "B-2"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_reads_periods_and_marks_current() {
        let m = build_model(&fixture::report()).unwrap();
        assert_eq!(m.periods.len(), 6);
        assert_eq!(m.header.current_period.as_deref(), Some("P2"));
        let cur = m.current().unwrap();
        assert_eq!(cur.label, "P2");
        assert_eq!(cur.month, "2026-08");
        assert_eq!(m.periods[0].variance, "+24");
        assert_eq!(m.periods[0].achievement, "125%");
        assert_eq!(m.periods[0].sub_periods[0].label, "W1");
        assert_eq!(m.totals.planned, 570);
        assert_eq!(m.totals.actual, 131);
    }

    #[test]
    fn model_carries_diagnostics_and_integrity() {
        let m = build_model(&fixture::report()).unwrap();
        assert_eq!(m.diagnostics.malformed, vec!["#4: missing_unit_id".to_string()]);
        assert_eq!(m.diagnostics.terminal_variance, "-90");
        assert_eq!(m.integrity.baseline_roster_size, 2);
        assert!(m.integrity.input_sha256.is_none());
        assert_eq!(m.policies.len(), 4);
        assert_eq!(m.policies[0].value, "spread_remaining");
    }

    #[test]
    fn missing_fields_are_reported_by_pointer() {
        let mut r = fixture::report();
        r["totals"].as_object_mut().unwrap().remove("basePlan");
        assert_eq!(
            build_model(&r).unwrap_err(),
            ReportError::MissingField("/totals/basePlan".into())
        );
    }

    #[test]
    fn foreign_ids_and_short_horizons_are_rejected() {
        let mut r = fixture::report();
        r["id"] = "RES:abc".into();
        assert!(matches!(build_model(&r), Err(ReportError::Inconsistent(_))));

        let mut r = fixture::report();
        r["periods"].as_array_mut().unwrap().pop();
        assert!(matches!(build_model(&r), Err(ReportError::Inconsistent(_))));
    }

    #[cfg(feature = "render_json")]
    #[test]
    fn json_render_is_stable() {
        let m = build_model(&fixture::report()).unwrap();
        let a = render_json(&m).unwrap();
        let b = render_json(&build_model(&fixture::report()).unwrap()).unwrap();
        assert_eq!(a, b);
        let v: Value = serde_json::from_str(&a).unwrap();
        assert_eq!(v["header"]["current_period"], "P2");
    }
}
