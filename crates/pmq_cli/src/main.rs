// crates/pmq_cli/src/main.rs
//
// Exit codes, typed error mapping, tracing setup, and the run path
// (load → overrides → pipeline → canonical artifact → optional rendering).

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const INVARIANT: i32 = 3;
    pub const IO: i32 = 4;
    pub const RENDER: i32 = 5;
}

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{parse_and_validate as parse_cli, Args};

use pmq_core::horizon::{Clock, FixedClock, SystemClock};
use pmq_core::variables::EngineConfig;
use pmq_io::prelude::{load_config, load_snapshot, to_canonical_json_bytes, write_bytes_atomic};
use pmq_io::IoError;
use pmq_pipeline::{run_with_ctx, validate_inputs, PipelineCtx, PipelineError, QuotaReport};
use pmq_report::{build_model, ReportError, ReportModel};

const REPORT_FILE: &str = "quota_report.json";

/// Central error type for CLI → exit-code mapping.
#[derive(Debug, Error)]
enum MainError {
    /// Bad flags, config, snapshot shape, or cutoff.
    #[error("{0}")]
    Validation(String),
    /// A computed plan broke an internal invariant.
    #[error("{0}")]
    Invariant(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Render(String),
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("pmq: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_tracing(&args);

    let result = if args.validate_only {
        validate_only(&args)
    } else {
        run_once(&args)
    };

    let rc = match result {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("pmq: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// stderr fmt layer; `RUST_LOG` wins unless `--quiet`.
fn init_tracing(args: &Args) {
    let filter = if args.quiet {
        EnvFilter::new("error")
    } else {
        let default = if args.verbose { "debug" } else { "warn" };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Invariant(_) => INVARIANT,
        MainError::Io(_) => IO,
        MainError::Render(_) => RENDER,
    }
}

fn map_io_err(e: IoError) -> MainError {
    match e {
        IoError::Path(m) => MainError::Io(format!("path: {m}")),
        IoError::Json { pointer, msg } => MainError::Validation(format!("json {pointer}: {msg}")),
        IoError::Invalid(m) => MainError::Validation(m),
        IoError::Hash(m) => MainError::Invariant(format!("hash: {m}")),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Input(_) | PipelineError::Horizon(_) | PipelineError::InvalidCutoff(_) => {
            MainError::Validation(e.to_string())
        }
        PipelineError::Invariant(_) | PipelineError::Build(_) => MainError::Invariant(e.to_string()),
    }
}

fn map_report_err(e: ReportError) -> MainError {
    MainError::Render(e.to_string())
}

/// Load snapshot + config and apply flag overrides.
fn load_ctx(args: &Args) -> Result<PipelineCtx, MainError> {
    let loaded = load_snapshot(&args.snapshot).map_err(map_io_err)?;
    debug!(path = %args.snapshot.display(), sha256 = %loaded.sha256, "snapshot loaded");

    let base = match &args.config {
        Some(p) => load_config(p).map_err(map_io_err)?,
        None => EngineConfig::default(),
    };
    let config = args
        .apply_overrides(base)
        .map_err(|e| MainError::Validation(e.to_string()))?;

    let clock: Box<dyn Clock> = match args.as_of {
        Some(d) => Box::new(FixedClock(d)),
        None => Box::new(SystemClock),
    };
    Ok(PipelineCtx::new(loaded.snapshot, config, clock.as_ref()).with_input_sha256(loaded.sha256))
}

/// Validate-only path (no report, no artifacts).
fn validate_only(args: &Args) -> Result<(), MainError> {
    let ctx = load_ctx(args)?;
    let summary = validate_inputs(&ctx).map_err(map_pipeline_err)?;
    if !args.quiet {
        eprintln!(
            "validate-only: inputs OK ({} events, {} malformed)",
            summary.events, summary.malformed_events
        );
    }
    Ok(())
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let ctx = load_ctx(args)?;
    let report = run_with_ctx(&ctx).map_err(map_pipeline_err)?;
    let value = report
        .to_value()
        .map_err(|e| MainError::Invariant(e.to_string()))?;
    let bytes = to_canonical_json_bytes(&value);

    match &args.out {
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&bytes)
                .and_then(|_| stdout.write_all(b"\n"))
                .map_err(|e| MainError::Io(format!("stdout: {e}")))?;
        }
        Some(out_dir) => {
            write_artifacts(out_dir, &bytes)?;
            maybe_render_reports(args, &value, out_dir)?;
            if !args.quiet {
                eprintln!("run: {} written to {}", report.id, out_dir.display());
            }
        }
    }
    log_summary(&report);
    Ok(())
}

fn log_summary(report: &QuotaReport) {
    let d = &report.body.diagnostics;
    info!(
        id = %report.id,
        population = report.body.totals.total_population,
        malformed = d.malformed_count,
        clamped = d.clamped_periods.len(),
        "run complete"
    );
}

fn write_artifacts(out_dir: &Path, bytes: &[u8]) -> Result<(), MainError> {
    fs::create_dir_all(out_dir)
        .map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;
    write_bytes_atomic(&out_dir.join(REPORT_FILE), bytes)
        .map_err(|e| MainError::Io(format!("write {REPORT_FILE}: {e}")))
}

fn maybe_render_reports(args: &Args, report: &serde_json::Value, out_dir: &Path) -> Result<(), MainError> {
    if args.render.is_empty() {
        return Ok(());
    }
    let model = build_model(report).map_err(map_report_err)?;
    for fmt in &args.render {
        match fmt.as_str() {
            "json" => render_json_report(&model, out_dir)?,
            "text" => render_text_report(&model, out_dir)?,
            other => return Err(MainError::Render(format!("unknown renderer: {other}"))),
        }
    }
    Ok(())
}

fn render_json_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let body = pmq_report::render_json(model).map_err(map_report_err)?;
        write_rendered(out_dir, "report.json", &body)
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render(
            "json renderer not enabled (build with feature `report-json`)".into(),
        ))
    }
}

fn render_text_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-text")]
    {
        let body = pmq_report::render_text(model).map_err(map_report_err)?;
        write_rendered(out_dir, "report.txt", &body)
    }
    #[cfg(not(feature = "report-text"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render(
            "text renderer not enabled (build with feature `report-text`)".into(),
        ))
    }
}

#[cfg(any(feature = "report-json", feature = "report-text"))]
fn write_rendered(out_dir: &Path, name: &str, body: &str) -> Result<(), MainError> {
    write_bytes_atomic(&out_dir.join(name), body.as_bytes())
        .map_err(|e| MainError::Io(format!("write {name}: {e}")))
}
