// crates/pmq_cli/src/args.rs
//
// Offline CLI argument surface: flag types, path checks, and the policy
// overrides applied on top of the config file.
//
// Rules:
// - No networked paths (reject any scheme:// like http/https/file)
// - --snapshot is required; --config is optional
// - Output: stdout by default, or --out dir with --render [json|text]*
// - --validate-only loads and checks inputs without building a report

use std::env;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use thiserror::Error;

use pmq_core::variables::{
    AchievementCap, EngineConfig, ReconcilePolicy, RemainderPolicy, VarsError, ZeroPlanPolicy,
};

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "pmq",
    version,
    disable_help_subcommand = true,
    about = "Offline, deterministic preventive-maintenance quota reconciliation"
)]
pub struct Args {
    // --- Inputs ---
    /// Snapshot JSON: service events plus a unit list or a pre-counted population.
    #[arg(long)]
    pub snapshot: PathBuf,
    /// EngineConfig JSON (all keys optional).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Reference date (YYYY-MM-DD). Defaults to today's local date.
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    // --- Policy overrides (win over --config) ---
    /// next_period | spread_remaining
    #[arg(long, value_name = "POLICY")]
    pub reconcile: Option<ReconcilePolicy>,
    /// leading_periods | final_period
    #[arg(long, value_name = "POLICY")]
    pub remainder: Option<RemainderPolicy>,
    /// zero | full
    #[arg(long, value_name = "POLICY")]
    pub zero_plan: Option<ZeroPlanPolicy>,
    /// uncapped | capped_100
    #[arg(long, value_name = "POLICY")]
    pub cap: Option<AchievementCap>,
    /// Count only events of this category.
    #[arg(long)]
    pub category: Option<String>,
    /// First day of the horizon (must be the first of a month).
    #[arg(long)]
    pub horizon_start: Option<NaiveDate>,
    /// Population cutoff date.
    #[arg(long)]
    pub cutoff: Option<NaiveDate>,

    // --- Output & rendering ---
    /// Output directory. Without it the canonical report goes to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Renderer(s) to emit into --out. Repeatable.
    #[arg(long, value_parser = ["json", "text"], requires = "out")]
    pub render: Vec<String>,

    // --- Control ---
    /// Load and validate inputs only; no report is built.
    #[arg(long)]
    pub validate_only: bool,
    /// Only errors on stderr.
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,
    /// Debug-level logs on stderr (RUST_LOG still wins).
    #[arg(long)]
    pub verbose: bool,
}

/// Errors surfaced by argument validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug, Error)]
pub enum CliError {
    #[error("path must be local file (no scheme): {0}")]
    NonLocalPath(String),
    #[error("invalid override: {0}")]
    Override(#[from] VarsError),
}

/// Reject any explicit URI scheme (e.g., http://, https://, file://).
#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        Some(args.snapshot.as_path()),
        args.config.as_deref(),
        args.out.as_deref(),
    ]
    .into_iter()
    .flatten()
}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

/// Path checks and normalization, split from parsing for tests.
pub fn validate(mut args: Args) -> Result<Args, CliError> {
    for p in iter_all_paths(&args) {
        ensure_local_path(p)?;
    }
    args.snapshot = normalize_path(&args.snapshot);
    args.config = args.config.take().map(|p| normalize_path(&p));
    args.out = args.out.take().map(|p| normalize_path(&p));
    Ok(args)
}

impl Args {
    /// Layer flag overrides onto `base`, then re-check domains.
    pub fn apply_overrides(&self, base: EngineConfig) -> Result<EngineConfig, CliError> {
        let mut cfg = base;
        if let Some(p) = self.reconcile {
            cfg.reconcile_policy = p;
        }
        if let Some(p) = self.remainder {
            cfg.remainder_policy = p;
        }
        if let Some(p) = self.zero_plan {
            cfg.zero_plan_policy = p;
        }
        if let Some(p) = self.cap {
            cfg.achievement_cap = p;
        }
        if let Some(c) = &self.category {
            cfg.service_category = Some(c.trim().to_string());
        }
        if self.horizon_start.is_some() {
            cfg.horizon_start = self.horizon_start;
        }
        if self.cutoff.is_some() {
            cfg.population_cutoff = self.cutoff;
        }
        cfg.validate_domains()?;
        Ok(cfg)
    }
}

/// Best-effort absolute path; falls back to CWD-relative when canonicalize fails.
fn normalize_path(p: &Path) -> PathBuf {
    std::fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}
