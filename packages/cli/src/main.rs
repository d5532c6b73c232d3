#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the crash map pipeline.
//!
//! Runs every stage for one window of years and reports per-stage
//! outcomes. Uses `indicatif-log-bridge` (via
//! [`crash_map_cli_utils::init_logger`]) so log lines and progress bars
//! never fight for the terminal.

mod interactive;

use std::io::IsTerminal as _;

use chrono::Datelike as _;
use clap::Parser;
use crash_map_cli_utils::IndicatifProgress;
use crash_map_ingest::run_pipeline;
use crash_map_ingest_models::{PipelineSummary, RunParameters, StageOutcome};

#[derive(Parser)]
#[command(
    name = "crash_map_cli",
    about = "Prepare collision data with holiday and borough enrichment"
)]
struct Cli {
    /// Most recent crash year to keep (default: the current year)
    #[arg(long)]
    year: Option<i32>,
    /// Number of earlier years to keep as well (default: 0)
    #[arg(long)]
    window: Option<u32>,
}

/// Fills unset flags with their defaults.
fn parameters_from_flags(
    year: Option<i32>,
    window: Option<u32>,
    current_year: i32,
) -> RunParameters {
    RunParameters {
        reference_year: year.unwrap_or(current_year),
        window: window.unwrap_or_default(),
    }
}

/// Resolves the run parameters, prompting when no flag was given and a
/// user is at the terminal.
fn resolve_parameters(cli: &Cli) -> Result<RunParameters, dialoguer::Error> {
    let defaults = parameters_from_flags(cli.year, cli.window, chrono::Local::now().year());

    if cli.year.is_none() && cli.window.is_none() && std::io::stdin().is_terminal() {
        interactive::prompt_parameters(defaults)
    } else {
        Ok(defaults)
    }
}

fn report(summary: &PipelineSummary) {
    for (stage, outcome) in &summary.stages {
        match outcome {
            StageOutcome::Completed { rows } => log::info!("{stage}: completed ({rows})"),
            StageOutcome::Failed { error } => log::error!("{stage}: failed: {error}"),
            StageOutcome::Skipped => log::info!("{stage}: skipped"),
        }
    }

    let failures = summary.failures().len();
    if failures == 0 {
        log::info!("Pipeline finished in {:.1}s", summary.duration.as_secs_f64());
    } else {
        log::warn!(
            "Pipeline finished in {:.1}s with {failures} failed stage(s)",
            summary.duration.as_secs_f64()
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crash_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let params = resolve_parameters(&cli)?;
    let config = crash_map_ingest::load_config()?;
    let source = crash_map_ingest::holiday_source(&config.holidays)?;

    let summary = run_pipeline(&config, params, &source, |stage| {
        IndicatifProgress::stage_bar(&multi, stage)
    })
    .await;

    report(&summary);
    Ok(())
}
