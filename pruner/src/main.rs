//! Repository pruner for proof exports.
//!
//! Run from the repository root with no arguments to strip plotting, obsolete
//! and exploratory test code and install `CMakeLists.proof_only.txt` as
//! `CMakeLists.txt`. Re-running is safe: every step is idempotent.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pruner::core::types::{PlannedAction, PlannedStep, RunSummary};
use pruner::exit_codes;
use pruner::export::{ExportOverrides, plan_export, resolve_settings, run_export};
use pruner::io::manifest_store::render_manifest;
use pruner::logging;

#[derive(Parser)]
#[command(
    name = "pruner",
    version,
    about = "Prune a proof repository down to its publishable subset"
)]
struct Cli {
    /// Repository root (defaults to the current directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// TOML manifest to apply instead of the configured or built-in one.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error, off).
    #[arg(long)]
    log_level: Option<String>,

    /// Report what would be removed without touching the tree.
    #[arg(long, conflicts_with = "print_manifest")]
    dry_run: bool,

    /// Print the effective manifest as TOML and exit.
    #[arg(long)]
    print_manifest: bool,

    /// Print results as JSON instead of text.
    #[arg(long, conflicts_with = "print_manifest")]
    json: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::FAILED);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let overrides = ExportOverrides {
        manifest: cli.manifest,
        log_level: cli.log_level,
    };
    let mut settings = resolve_settings(&root, &overrides)?;
    settings.log = settings.log.with_env_override();
    logging::init(&settings.log);

    if cli.print_manifest {
        print!("{}", render_manifest(&settings.manifest)?);
        return Ok(());
    }

    if cli.dry_run {
        let steps = plan_export(&settings)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&steps).context("serialize plan")?);
        } else {
            for step in &steps {
                println!("{}", render_step(step));
            }
        }
        return Ok(());
    }

    let summary = run_export(&settings)?;
    if cli.json {
        println!("{}", serde_json::to_string(&summary).context("serialize summary")?);
    } else {
        println!("{}", render_summary(&summary));
    }
    Ok(())
}

fn render_step(step: &PlannedStep) -> String {
    let state = if step.present { "present" } else { "absent" };
    match step.action {
        PlannedAction::RemoveFile => format!("plan: remove file {} ({state})", step.path),
        PlannedAction::RemoveTree => format!("plan: remove tree {} ({state})", step.path),
        PlannedAction::Substitute => format!(
            "plan: replace {} with {} ({state})",
            step.path,
            step.source.as_deref().unwrap_or_default()
        ),
    }
}

fn render_summary(summary: &RunSummary) -> String {
    format!(
        "prune: removed={} not_found={} substituted={}",
        summary.removed, summary.not_found, summary.substituted
    )
}
