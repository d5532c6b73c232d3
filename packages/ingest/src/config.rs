//! Pipeline configuration loading.
//!
//! The default configuration is baked into the binary at compile time via
//! [`include_str!`]. Setting `CRASH_MAP_CONFIG` to a TOML file path
//! replaces it wholesale.

use std::path::Path;

use crash_map_ingest_models::PipelineConfig;

/// Environment variable naming an override configuration file.
pub const CONFIG_ENV_VAR: &str = "CRASH_MAP_CONFIG";

/// Default configuration embedded at compile time.
const DEFAULT_CONFIG: &str = include_str!("../config/crash_map.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The override file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML did not match the configuration schema.
    #[error("Invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Parses a configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Toml`] if the text is not a valid configuration.
pub fn parse_config(toml_str: &str) -> Result<PipelineConfig, ConfigError> {
    Ok(toml::from_str(toml_str)?)
}

/// Returns the embedded default configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Toml`] if the embedded TOML is invalid.
pub fn default_config() -> Result<PipelineConfig, ConfigError> {
    parse_config(DEFAULT_CONFIG)
}

/// Reads a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&contents)
}

/// Loads the configuration named by `CRASH_MAP_CONFIG`, falling back to
/// the embedded default.
///
/// # Errors
///
/// Returns [`ConfigError`] if the override file cannot be read or either
/// configuration fails to parse.
pub fn load_config() -> Result<PipelineConfig, ConfigError> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => {
            log::info!("Loading configuration from {path}");
            load_config_file(Path::new(path.trim()))
        }
        _ => {
            log::debug!("{CONFIG_ENV_VAR} not set; using embedded configuration");
            default_config()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses() {
        let config = default_config().unwrap();
        assert_eq!(config.holidays.jurisdiction, "US-NY");
        assert_eq!(config.holidays.timeout_secs, 10);
        assert!(config.cleansing.factors.fold_case);
        assert_eq!(config.cleansing.factors.sentinels, ["Unspecified"]);
        assert_eq!(
            config.cleansing.factors.corrections.get("illnes").map(String::as_str),
            Some("illness")
        );
        assert!(!config.cleansing.vehicles.fold_case);
        assert!(config.filters.require_borough);
    }

    #[test]
    fn optional_sections_default() {
        let config = parse_config(
            r#"
            [input]
            crashes_csv = "crashes.csv"
            boundaries = "boroughs.geojson"

            [output]
            dir = "out"

            [holidays]
            base_url = "http://localhost"
            country = "US"
            jurisdiction = "US-NY"

            [cleansing]
            "#,
        )
        .unwrap();
        assert_eq!(config.input.boundary_name_property, "BoroName");
        assert_eq!(config.output.table_file, "cleaned_merged.parquet");
        assert!(config.output.chart_data);
        assert!(!config.output.dimensional_model);
        assert!(config.filters.require_complete_casualties);
        assert!(config.cleansing.factors.sentinels.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("crash_map_config_test_missing.toml");
        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::Io { .. })
        ));
    }
}
