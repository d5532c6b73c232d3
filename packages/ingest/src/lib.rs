#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Collision preparation pipeline.
//!
//! Reads the raw collision CSV, narrows it to a window of years, aligns it
//! with public holidays, cleanses the free-text columns, attributes each
//! collision to a borough by point-in-polygon lookup, derives severity and
//! location metrics, and hands the result to the exporters.
//!
//! Each [`Stage`] is isolated: a failure is logged and recorded in the
//! [`PipelineSummary`], and only stages that need its output are abandoned.

pub mod cleanse;
pub mod config;
pub mod enrich;
pub mod filter;
pub mod merge;
pub mod metrics;
pub mod normalize;
pub mod parsing;
pub mod profile;
pub mod progress;

use std::sync::Arc;
use std::time::Instant;

use crash_map_crash_models::{CrashRecord, HolidayRecord, MergedRecord};
use crash_map_holiday::nager::NagerDateSource;
use crash_map_holiday::{HolidayError, HolidaySource};
use crash_map_ingest_models::{
    HolidayConfig, PipelineConfig, PipelineSummary, RunParameters, Stage, StageOutcome,
};
use crash_map_spatial::{BoroughIndex, SpatialError};
use crate::progress::ProgressCallback;

pub use config::{ConfigError, load_config};

/// Errors that can abort a pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// An input file could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    /// The collision file is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The collision file lacks columns the pipeline depends on.
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// The borough boundaries could not be loaded.
    #[error("Boundary error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("Holiday error: {0}")]
    Holiday(#[from] HolidayError),

    /// An output could not be written.
    #[error("Export error: {0}")]
    Export(#[from] crash_map_generate::ExportError),

    /// A stage this one depends on did not produce output.
    #[error("Input from the {stage} stage is unavailable")]
    MissingInput { stage: Stage },
}

/// Builds the HTTP holiday source described by the configuration.
///
/// # Errors
///
/// Returns [`IngestError::Holiday`] if the HTTP client cannot be built.
pub fn holiday_source(config: &HolidayConfig) -> Result<NagerDateSource, IngestError> {
    Ok(NagerDateSource::new(
        &config.base_url,
        &config.country,
        config.timeout(),
    )?)
}

/// Reads, normalizes, and year-filters the collision file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or lacks required
/// columns.
pub fn process_crashes(
    config: &PipelineConfig,
    params: &RunParameters,
    progress: &dyn ProgressCallback,
) -> Result<Vec<CrashRecord>, IngestError> {
    let records = normalize::read_crashes(&config.input.crashes_csv, progress)?;
    profile::log_profile("Raw crashes", &records, &[]);

    let records = filter::filter_year_window(records, params);
    profile::log_profile("Crashes in window", &records, &[profile::RAW_BOROUGH]);
    progress.set_message(format!("{} crashes in window", records.len()));
    Ok(records)
}

/// Fetches and cleanses the holidays covering the run's window.
///
/// Fetch failures are logged by the extractor and yield fewer (possibly
/// zero) holidays rather than an error.
pub async fn process_holidays(
    source: &dyn HolidaySource,
    config: &HolidayConfig,
    params: &RunParameters,
    progress: &dyn ProgressCallback,
) -> Vec<HolidayRecord> {
    progress.set_total(u64::from(params.window) + 1);
    let raw =
        crash_map_holiday::extract_all_holidays(source, params.reference_year, params.window).await;
    progress.inc(u64::from(params.window) + 1);

    let holidays = crash_map_holiday::clean_and_transform(&raw, &config.jurisdiction);
    if let Some(first) = holidays.first() {
        log::info!("Earliest public holiday: {}", first.holiday_date);
    }
    holidays
}

/// Cleanses, enriches, filters, and derives metrics for the windowed
/// collisions, then joins them with the holidays.
#[must_use]
pub fn merge_and_enrich(
    mut crashes: Vec<CrashRecord>,
    holidays: &[HolidayRecord],
    index: &BoroughIndex,
    config: &PipelineConfig,
    progress: &dyn ProgressCallback,
) -> Vec<MergedRecord> {
    progress.set_total(crashes.len() as u64);

    let cleansers = cleanse::Cleansers::new(&config.cleansing);
    for record in &mut crashes {
        cleansers.apply(record);
    }

    enrich::enrich_all(&mut crashes, index);

    let mut crashes = filter::apply_row_filters(crashes, &config.filters);
    metrics::apply_metrics(&mut crashes);
    progress.inc(crashes.len() as u64);

    let merged = merge::merge_holidays(crashes, holidays);
    profile::log_merged_profile("Cleaned and merged", &merged);
    merged
}

/// Records a stage result in the summary, logging failures.
fn record<T>(
    summary: &mut PipelineSummary,
    stage: Stage,
    progress: &dyn ProgressCallback,
    result: Result<T, IngestError>,
    rows: impl FnOnce(&T) -> usize,
) -> Option<T> {
    match result {
        Ok(value) => {
            let rows = rows(&value);
            progress.finish(format!("{}: {rows} rows", stage.label()));
            summary
                .stages
                .push((stage, StageOutcome::Completed { rows }));
            Some(value)
        }
        Err(e) => {
            log::error!("Stage {stage} failed: {e}");
            progress.finish(format!("{}: failed", stage.label()));
            summary.stages.push((
                stage,
                StageOutcome::Failed {
                    error: e.to_string(),
                },
            ));
            None
        }
    }
}

/// Runs every stage of the pipeline.
///
/// `make_progress` supplies a progress handle per stage. The returned
/// summary lists the outcome of every stage; the function itself never
/// fails.
pub async fn run_pipeline(
    config: &PipelineConfig,
    params: RunParameters,
    source: &dyn HolidaySource,
    make_progress: impl Fn(Stage) -> Arc<dyn ProgressCallback>,
) -> PipelineSummary {
    let start = Instant::now();
    let mut summary = PipelineSummary::default();
    log::info!(
        "Preparing collisions for {}..={}",
        params.first_year(),
        params.reference_year
    );

    let progress = make_progress(Stage::Crashes);
    let crashes = record(
        &mut summary,
        Stage::Crashes,
        progress.as_ref(),
        process_crashes(config, &params, progress.as_ref()),
        Vec::len,
    );

    let progress = make_progress(Stage::Holidays);
    let holidays = process_holidays(source, &config.holidays, &params, progress.as_ref()).await;
    let holidays = record(
        &mut summary,
        Stage::Holidays,
        progress.as_ref(),
        Ok(holidays),
        Vec::len,
    )
    .unwrap_or_default();

    let progress = make_progress(Stage::Merge);
    let merged = crashes
        .ok_or(IngestError::MissingInput {
            stage: Stage::Crashes,
        })
        .and_then(|crashes| {
            let index =
                BoroughIndex::load(&config.input.boundaries, &config.input.boundary_name_property)?;
            Ok(merge_and_enrich(
                crashes,
                &holidays,
                &index,
                config,
                progress.as_ref(),
            ))
        });
    let merged = record(
        &mut summary,
        Stage::Merge,
        progress.as_ref(),
        merged,
        Vec::len,
    );

    let progress = make_progress(Stage::Export);
    let exported = export_stage(merged.as_deref(), |records| {
        Ok(crash_map_generate::write_crashes(
            records,
            &config.output.table_path(),
        )?)
    });
    record(
        &mut summary,
        Stage::Export,
        progress.as_ref(),
        exported,
        |rows| *rows,
    );

    if config.output.dimensional_model {
        let progress = make_progress(Stage::DataModel);
        let written = export_stage(merged.as_deref(), |records| {
            let model = crash_map_dimension::build_data_model(records.to_vec());
            Ok(crash_map_generate::write_data_model(
                &model,
                &config.output.model_dir(),
            )?)
        });
        record(
            &mut summary,
            Stage::DataModel,
            progress.as_ref(),
            written,
            |rows| *rows,
        );
    } else {
        summary.stages.push((Stage::DataModel, StageOutcome::Skipped));
    }

    if config.output.chart_data {
        let progress = make_progress(Stage::ChartData);
        let written = export_stage(merged.as_deref(), |records| {
            Ok(crash_map_generate::write_chart_data(
                records,
                &config.output.charts_dir(),
            )?)
        });
        record(
            &mut summary,
            Stage::ChartData,
            progress.as_ref(),
            written,
            |files| *files,
        );
    } else {
        summary.stages.push((Stage::ChartData, StageOutcome::Skipped));
    }

    summary.duration = start.elapsed();
    summary
}

/// Runs an output stage on the merged records, failing when the merge
/// stage produced nothing.
fn export_stage(
    merged: Option<&[MergedRecord]>,
    write: impl FnOnce(&[MergedRecord]) -> Result<usize, IngestError>,
) -> Result<usize, IngestError> {
    let records = merged.ok_or(IngestError::MissingInput { stage: Stage::Merge })?;
    write(records)
}
