//! Field normalization of the raw collision CSV.
//!
//! Headers are rewritten to their lower-case, underscore-delimited form and
//! each row is coerced into a typed [`CrashRecord`]. Unparseable cells null
//! their field; a file missing required columns is rejected outright.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike as _, NaiveDate, Timelike as _};
use crash_map_crash_models::{Borough, Casualties, CrashRecord, VEHICLE_SLOTS, columns};

use crate::IngestError;
use crate::parsing::{non_empty, parse_coordinate, parse_count, parse_crash_date, parse_crash_time};
use crate::progress::ProgressCallback;

/// Rows read between progress updates.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Maps normalized column names to their position in each row.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: BTreeMap<String, usize>,
    factor_columns: [String; VEHICLE_SLOTS],
    vehicle_columns: [String; VEHICLE_SLOTS],
}

impl ColumnIndex {
    /// Builds the index from a raw header row, normalizing every name.
    #[must_use]
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut positions = BTreeMap::new();
        for (i, header) in headers.into_iter().enumerate() {
            // Keep the first occurrence if two headers normalize the same.
            positions.entry(columns::normalize_name(header)).or_insert(i);
        }

        Self {
            positions,
            factor_columns: std::array::from_fn(|i| columns::contributing_factor(i + 1)),
            vehicle_columns: std::array::from_fn(|i| columns::vehicle_type(i + 1)),
        }
    }

    /// Required columns absent from the header row.
    #[must_use]
    pub fn missing_columns(&self) -> Vec<String> {
        columns::REQUIRED
            .iter()
            .map(ToString::to_string)
            .chain(self.factor_columns.iter().cloned())
            .chain(self.vehicle_columns.iter().cloned())
            .filter(|c| !self.positions.contains_key(c))
            .collect()
    }

    /// Fails with [`IngestError::MissingColumns`] if any required column is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingColumns`] listing every absent column.
    pub fn validate(&self) -> Result<(), IngestError> {
        let missing = self.missing_columns();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(IngestError::MissingColumns { columns: missing })
        }
    }

    /// Raw cell for `column`, or `None` if the column or cell is absent.
    fn cell<'r>(&self, row: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.positions.get(column).and_then(|&i| row.get(i))
    }

    fn text(&self, row: &csv::StringRecord, column: &str) -> Option<String> {
        self.cell(row, column)
            .and_then(non_empty)
            .map(str::to_string)
    }

    fn count(&self, row: &csv::StringRecord, column: &str) -> Option<u32> {
        self.cell(row, column).and_then(parse_count)
    }

    fn coordinate(&self, row: &csv::StringRecord, column: &str) -> Option<f64> {
        self.cell(row, column).and_then(parse_coordinate)
    }
}

/// Reads and normalizes a collision CSV file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened, is not valid CSV,
/// or lacks a required column.
pub fn read_crashes(
    path: &Path,
    progress: &dyn ProgressCallback,
) -> Result<Vec<CrashRecord>, IngestError> {
    log::info!("Loading crash data from {}", path.display());
    let file = std::fs::File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let records = read_crashes_from(file, progress)?;
    log::info!("Crash data loaded: {} rows", records.len());
    Ok(records)
}

/// Reads and normalizes collision CSV from any reader.
///
/// # Errors
///
/// Returns [`IngestError`] if the input is not valid CSV or lacks a
/// required column.
pub fn read_crashes_from<R: Read>(
    reader: R,
    progress: &dyn ProgressCallback,
) -> Result<Vec<CrashRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let index = ColumnIndex::from_headers(reader.headers()?.iter());
    index.validate()?;

    let mut records = Vec::new();
    let mut unparsed_dates: u64 = 0;
    let mut unparsed_times: u64 = 0;

    for result in reader.records() {
        let row = result?;
        let record = normalize_row(&index, &row);

        if record.crash_date.is_none() {
            unparsed_dates += 1;
        }
        if record.crash_time.is_none() {
            unparsed_times += 1;
        }

        records.push(record);
        if records.len() as u64 % PROGRESS_INTERVAL == 0 {
            progress.inc(PROGRESS_INTERVAL);
        }
    }
    progress.inc(records.len() as u64 % PROGRESS_INTERVAL);

    if unparsed_dates > 0 || unparsed_times > 0 {
        log::warn!(
            "{unparsed_dates} rows with an unparseable crash date, {unparsed_times} with an unparseable crash time"
        );
    }

    Ok(records)
}

/// Coerces one CSV row into a [`CrashRecord`].
#[must_use]
pub fn normalize_row(index: &ColumnIndex, row: &csv::StringRecord) -> CrashRecord {
    let crash_date = index.cell(row, columns::CRASH_DATE).and_then(parse_crash_date);
    let crash_time = index.cell(row, columns::CRASH_TIME).and_then(parse_crash_time);

    let raw_borough = index.text(row, columns::BOROUGH).and_then(|raw| {
        let coerced = Borough::coerce(&raw);
        if coerced.is_none() {
            log::debug!("Unrecognized borough {raw:?}");
        }
        coerced
    });

    CrashRecord {
        collision_id: index.text(row, columns::COLLISION_ID).unwrap_or_default(),
        crash_date,
        crash_time,
        crash_hour: crash_time.map(|t| t.hour()),
        crash_day: crash_date.map(day_name),
        crash_month: crash_date.map(month_name),
        crash_year: crash_date.map(|d| d.year()),
        raw_borough,
        borough: None,
        zip_code: index.text(row, columns::ZIP_CODE),
        latitude: index.coordinate(row, columns::LATITUDE),
        longitude: index.coordinate(row, columns::LONGITUDE),
        location: index.text(row, columns::LOCATION),
        on_street_name: index.text(row, columns::ON_STREET_NAME),
        cross_street_name: index.text(row, columns::CROSS_STREET_NAME),
        off_street_name: index.text(row, columns::OFF_STREET_NAME),
        casualties: Casualties {
            persons_injured: index.count(row, columns::PERSONS_INJURED),
            persons_killed: index.count(row, columns::PERSONS_KILLED),
            pedestrians_injured: index.count(row, columns::PEDESTRIANS_INJURED),
            pedestrians_killed: index.count(row, columns::PEDESTRIANS_KILLED),
            cyclists_injured: index.count(row, columns::CYCLISTS_INJURED),
            cyclists_killed: index.count(row, columns::CYCLISTS_KILLED),
            motorists_injured: index.count(row, columns::MOTORISTS_INJURED),
            motorists_killed: index.count(row, columns::MOTORISTS_KILLED),
        },
        contributing_factors: index
            .factor_columns
            .each_ref()
            .map(|c| index.text(row, c)),
        vehicle_types: index
            .vehicle_columns
            .each_ref()
            .map(|c| index.text(row, c)),
        metrics: None,
    }
}

/// Full weekday name, e.g. `"Saturday"`.
fn day_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

/// Full month name, e.g. `"September"`.
fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}
