//! Plain-text renderer: horizon table, month-to-date breakdown of the current
//! period, then diagnostics and integrity lines. Fixed column widths, ASCII only.

use std::fmt::Write as _;

use crate::{PeriodRow, ReportError, ReportModel};

const RULE: &str = "------------------------------------------------------------------------";

pub fn render_text(model: &ReportModel) -> Result<String, ReportError> {
    let mut out = String::new();
    write_report(&mut out, model).map_err(|e| ReportError::Render(e.to_string()))?;
    Ok(out)
}

fn write_report(out: &mut String, m: &ReportModel) -> std::fmt::Result {
    writeln!(out, "{}", m.header.title)?;
    writeln!(
        out,
        "Horizon {} .. {} (exclusive){}",
        m.header.horizon_start,
        m.header.horizon_end,
        m.header
            .current_period
            .as_deref()
            .map(|p| format!(", current {p}"))
            .unwrap_or_default()
    )?;
    writeln!(
        out,
        "Population {} as of {}; base plan {} + remainder {}",
        m.totals.total_population, m.totals.population_as_of, m.totals.base_plan, m.totals.remainder
    )?;
    writeln!(out, "{RULE}")?;

    writeln!(
        out,
        "{:<3} {:<4} {:<7} {:>8} {:>8} {:>8} {:>8} {:>6}  {}",
        "", "Per", "Month", "Initial", "Adjusted", "Actual", "Var", "Ach", "Status"
    )?;
    for p in &m.periods {
        write_period_line(out, p)?;
    }
    writeln!(
        out,
        "{:<3} {:<4} {:<7} {:>8} {:>8} {:>8}",
        "", "Sum", "", m.totals.planned, "", m.totals.actual
    )?;

    if let Some(cur) = m.current() {
        writeln!(out, "{RULE}")?;
        writeln!(out, "Month to date: {} ({})", cur.label, cur.month)?;
        writeln!(out, "    {:<4} {:>8} {:>8} {:>6}  {}", "Wk", "Plan", "Actual", "Ach", "Status")?;
        for s in &cur.sub_periods {
            writeln!(
                out,
                "    {:<4} {:>8} {:>8} {:>6}  {}",
                s.label, s.plan, s.actual, s.achievement, s.status
            )?;
        }
    }

    writeln!(out, "{RULE}")?;
    let policies: Vec<String> = m.policies.iter().map(|p| format!("{}={}", p.key, p.value)).collect();
    writeln!(out, "Policies: {}", policies.join(" "))?;

    let d = &m.diagnostics;
    writeln!(
        out,
        "Diagnostics: malformed {}, duplicates {}, outside horizon {}, other category {}",
        d.malformed_count, d.duplicate_events, d.outside_horizon, d.filtered_category
    )?;
    for line in &d.malformed {
        writeln!(out, "  skipped {line}")?;
    }
    if !d.clamped_periods.is_empty() {
        writeln!(out, "  clamped to zero: {}", d.clamped_periods.join(", "))?;
    }
    writeln!(out, "  terminal variance: {}", d.terminal_variance)?;

    writeln!(out, "{RULE}")?;
    writeln!(out, "Report {}", m.integrity.report_id)?;
    if let Some(sha) = &m.integrity.input_sha256 {
        writeln!(out, "Input sha256 {sha}")?;
    }
    if m.integrity.baseline_roster_size > 0 {
        writeln!(out, "Baseline roster: {} units", m.integrity.baseline_roster_size)?;
    }
    Ok(())
}

fn write_period_line(out: &mut String, p: &PeriodRow) -> std::fmt::Result {
    writeln!(
        out,
        "{:<3} {:<4} {:<7} {:>8} {:>8} {:>8} {:>8} {:>6}  {}",
        if p.current { ">>" } else { "" },
        p.label,
        p.month,
        p.initial_plan,
        p.adjusted_plan,
        p.actual,
        p.variance,
        p.achievement,
        p.status
    )
}
