#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pipeline configuration, run parameters, and stage result types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Full pipeline configuration, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub holidays: HolidayConfig,
    pub cleansing: CleansingConfig,
    #[serde(default)]
    pub filters: FilterConfig,
}

/// Where the raw inputs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Collision feed CSV.
    pub crashes_csv: PathBuf,
    /// Borough boundary `GeoJSON` feature collection.
    pub boundaries: PathBuf,
    /// Feature property holding the borough name.
    #[serde(default = "default_boundary_name_property")]
    pub boundary_name_property: String,
}

fn default_boundary_name_property() -> String {
    "BoroName".to_string()
}

/// Where and what to write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root output directory.
    pub dir: PathBuf,
    /// File name of the cleansed output table (Parquet).
    #[serde(default = "default_table_file")]
    pub table_file: String,
    /// Also write fact and dimension tables.
    #[serde(default)]
    pub dimensional_model: bool,
    /// Also write chart aggregations.
    #[serde(default = "default_true")]
    pub chart_data: bool,
}

fn default_table_file() -> String {
    "cleaned_merged.parquet".to_string()
}

const fn default_true() -> bool {
    true
}

impl OutputConfig {
    /// Path of the cleansed output table.
    #[must_use]
    pub fn table_path(&self) -> PathBuf {
        self.dir.join("data").join(&self.table_file)
    }

    /// Directory holding the fact and dimension tables.
    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        self.dir.join("data").join("model")
    }

    /// Directory holding chart aggregations.
    #[must_use]
    pub fn charts_dir(&self) -> PathBuf {
        self.dir.join("charts")
    }
}

/// Holiday feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayConfig {
    pub base_url: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    /// Subdivision code whose local holidays are kept (e.g. `"US-NY"`).
    pub jurisdiction: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl HolidayConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Correction tables for the free-text columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleansingConfig {
    #[serde(default)]
    pub factors: CleanserConfig,
    #[serde(default)]
    pub vehicles: CleanserConfig,
}

/// One free-text correction table.
///
/// Values are trimmed first; `sentinels` are compared against the trimmed
/// raw value, `corrections` and `discard` against the (optionally
/// lower-cased) value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanserConfig {
    /// Lower-case values before applying corrections.
    #[serde(default)]
    pub fold_case: bool,
    /// Raw values meaning "not recorded" (e.g. `"Unspecified"`).
    #[serde(default)]
    pub sentinels: Vec<String>,
    /// Known misspelling -> canonical value.
    #[serde(default)]
    pub corrections: BTreeMap<String, String>,
    /// Garbage tokens replaced with null.
    #[serde(default)]
    pub discard: Vec<String>,
}

/// Row filters applied after enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct FilterConfig {
    /// Drop rows missing the first vehicle type or the persons
    /// injured/killed counts.
    #[serde(default = "default_true")]
    pub require_complete_casualties: bool,
    /// Drop rows still missing a borough, coordinates, or location text
    /// after enrichment.
    #[serde(default = "default_true")]
    pub require_borough: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            require_complete_casualties: true,
            require_borough: true,
        }
    }
}

/// The two per-run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Most recent calendar year to keep.
    pub reference_year: i32,
    /// Number of earlier years to keep as well (0 = reference year only).
    pub window: u32,
}

impl RunParameters {
    /// First calendar year inside the window.
    #[must_use]
    pub fn first_year(&self) -> i32 {
        i32::try_from(self.window)
            .ok()
            .and_then(|w| self.reference_year.checked_sub(w))
            .unwrap_or(i32::MIN)
    }
}

/// Independently failing sections of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Crashes,
    Holidays,
    Merge,
    Export,
    DataModel,
    ChartData,
}

impl Stage {
    /// Human-readable label for progress bars.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Crashes => "Preparing crashes",
            Self::Holidays => "Fetching holidays",
            Self::Merge => "Merging & enriching",
            Self::Export => "Writing output table",
            Self::DataModel => "Writing fact/dimension tables",
            Self::ChartData => "Writing chart data",
        }
    }
}

/// Outcome of one stage.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    /// Stage finished; `rows` is the number of rows it produced.
    Completed { rows: usize },
    /// Stage failed with the given error message.
    Failed { error: String },
    /// Stage was disabled by configuration.
    Skipped,
}

/// Result of a full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub stages: Vec<(Stage, StageOutcome)>,
    pub duration: Duration,
}

impl PipelineSummary {
    /// Stages that failed, with their error messages.
    #[must_use]
    pub fn failures(&self) -> Vec<(Stage, &str)> {
        self.stages
            .iter()
            .filter_map(|(stage, outcome)| match outcome {
                StageOutcome::Failed { error } => Some((*stage, error.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Outcome recorded for a stage, if it ran.
    #[must_use]
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_zero_is_reference_year_only() {
        let params = RunParameters {
            reference_year: 2023,
            window: 0,
        };
        assert_eq!(params.first_year(), 2023);
    }

    #[test]
    fn window_reaches_back() {
        let params = RunParameters {
            reference_year: 2024,
            window: 12,
        };
        assert_eq!(params.first_year(), 2012);
    }

    #[test]
    fn summary_lists_failures() {
        let summary = PipelineSummary {
            stages: vec![
                (Stage::Crashes, StageOutcome::Completed { rows: 3 }),
                (
                    Stage::Holidays,
                    StageOutcome::Failed {
                        error: "timeout".to_string(),
                    },
                ),
            ],
            duration: Duration::ZERO,
        };
        assert_eq!(summary.failures(), vec![(Stage::Holidays, "timeout")]);
        assert!(matches!(
            summary.outcome(Stage::Crashes),
            Some(StageOutcome::Completed { rows: 3 })
        ));
        assert!(summary.outcome(Stage::Export).is_none());
    }

    #[test]
    fn output_paths_nest_under_dir() {
        let output = OutputConfig {
            dir: PathBuf::from("out"),
            table_file: default_table_file(),
            dimensional_model: false,
            chart_data: true,
        };
        assert_eq!(
            output.table_path(),
            PathBuf::from("out/data/cleaned_merged.parquet")
        );
        assert_eq!(output.charts_dir(), PathBuf::from("out/charts"));
    }
}
