//! Render real pipeline output, not hand-written fixtures.

use assert_json_diff::assert_json_include;
use chrono::NaiveDate;
use serde_json::json;

use pmq_core::horizon::FixedClock;
use pmq_core::variables::EngineConfig;
use pmq_io::snapshot::parse_snapshot;
use pmq_pipeline::{run_with_ctx, PipelineCtx};
use pmq_report::{build_model, render_json, render_text};

fn report_value() -> serde_json::Value {
    let events: Vec<_> = (0..30)
        .map(|i| json!({"unit_id": format!("U{i}"), "timestamp": "2026-10-09T08:30:00", "category": 39}))
        .collect();
    let snap = json!({"population": {"total": 600}, "events": events}).to_string();
    let ctx = PipelineCtx::new(
        parse_snapshot(snap.as_bytes()).unwrap(),
        EngineConfig::default(),
        &FixedClock(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()),
    );
    run_with_ctx(&ctx).unwrap().to_value().unwrap()
}

#[test]
fn model_from_pipeline_report() {
    let v = report_value();
    let m = build_model(&v).unwrap();
    assert_eq!(m.integrity.report_id, v["id"].as_str().unwrap());
    let cur = m.current().unwrap();
    assert_eq!(cur.label, "P4");
    assert_eq!(cur.month, "2026-10");
    assert_eq!(cur.actual, 30);
    // Day 9 falls in the second week.
    assert_eq!(cur.sub_periods[1].actual, 30);
    assert_eq!(m.totals.planned, 600);
}

#[test]
fn json_and_text_renders_agree() {
    let m = build_model(&report_value()).unwrap();
    let j: serde_json::Value = serde_json::from_str(&render_json(&m).unwrap()).unwrap();
    assert_json_include!(
        actual: j,
        expected: json!({
            "header": {"horizon_start": "2026-07-01", "current_period": "P4"},
            "totals": {"total_population": 600, "base_plan": 100}
        })
    );
    let t = render_text(&m).unwrap();
    assert!(t.contains("Month to date: P4 (2026-10)"));
    assert!(t.contains(&m.integrity.report_id));
}
