#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Output generation for the cleansed collision table.
//!
//! Writes the wide merged table and, optionally, the fact and dimension
//! tables to Parquet through an in-memory `DuckDB` database, and writes
//! chart aggregations as CSV.

pub mod charts;
pub mod table;

use std::path::Path;

use crash_map_crash_models::MergedRecord;
use crash_map_dimension::DataModel;

pub use charts::write_chart_data;

/// Errors that can occur while writing outputs.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// `DuckDB` failed to create, fill, or copy a table.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// A chart file could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An output directory or file could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes the merged records to a Parquet file at `path`.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`ExportError`] if the table cannot be built or written.
pub fn write_crashes(records: &[MergedRecord], path: &Path) -> Result<usize, ExportError> {
    let duck = duckdb::Connection::open_in_memory()?;
    let rows = table::load_crashes(&duck, records)?;
    table::copy_to_parquet(&duck, table::CRASHES_TABLE, path)?;

    log::info!("Wrote {rows} rows to {}", path.display());
    Ok(rows)
}

/// Writes the fact table and its three dimension tables as Parquet files
/// in `dir`, one file per table.
///
/// Returns the number of fact rows written.
///
/// # Errors
///
/// Returns [`ExportError`] if any table cannot be built or written.
pub fn write_data_model(model: &DataModel, dir: &Path) -> Result<usize, ExportError> {
    let duck = duckdb::Connection::open_in_memory()?;
    let facts = table::load_data_model(&duck, model)?;

    for name in [
        table::FACT_TABLE,
        table::DIM_CONTRIBUTING_FACTORS.0,
        table::DIM_VEHICLE_TYPES.0,
        table::DIM_BOROUGHS.0,
    ] {
        table::copy_to_parquet(&duck, name, &dir.join(format!("{name}.parquet")))?;
    }

    log::info!(
        "Wrote dimensional model to {}: {facts} facts, {} factors, {} vehicle types, {} boroughs",
        dir.display(),
        model.contributing_factors.len(),
        model.vehicle_types.len(),
        model.boroughs.len()
    );
    Ok(facts)
}
