//! Row filters: the year window and the post-enrichment location and
//! completeness checks.

use std::ops::RangeInclusive;

use crash_map_crash_models::CrashRecord;
use crash_map_ingest_models::{FilterConfig, RunParameters};

/// Location text the feed uses for an unknown point.
pub const SENTINEL_LOCATION: &str = "(0.0, 0.0)";

/// Inclusive range of crash years kept for a run.
#[must_use]
pub fn year_window(params: &RunParameters) -> RangeInclusive<i32> {
    params.first_year()..=params.reference_year
}

/// Keeps records whose crash year falls inside the window. Records without
/// a year are dropped.
#[must_use]
pub fn filter_year_window(records: Vec<CrashRecord>, params: &RunParameters) -> Vec<CrashRecord> {
    let window = year_window(params);
    let before = records.len();

    let kept: Vec<CrashRecord> = records
        .into_iter()
        .filter(|r| r.crash_year.is_some_and(|year| window.contains(&year)))
        .collect();

    log::info!(
        "Year window {}..={}: kept {} of {before} records",
        window.start(),
        window.end(),
        kept.len()
    );
    kept
}

/// Whether the record carries the `(0.0, 0.0)` placeholder point.
#[must_use]
pub fn has_sentinel_location(record: &CrashRecord) -> bool {
    record.coordinates() == Some((0.0, 0.0))
        || record.location.as_deref() == Some(SENTINEL_LOCATION)
}

/// Whether any of location text, coordinates, borough (reported or
/// attributed), or zip code is present.
#[must_use]
pub const fn has_location_signal(record: &CrashRecord) -> bool {
    record.location.is_some()
        || record.longitude.is_some()
        || record.latitude.is_some()
        || record.raw_borough.is_some()
        || record.borough.is_some()
        || record.zip_code.is_some()
}

/// Whether the first vehicle type and the persons injured/killed counts
/// are all present.
#[must_use]
pub const fn has_complete_casualties(record: &CrashRecord) -> bool {
    record.vehicle_types[0].is_some()
        && record.casualties.persons_injured.is_some()
        && record.casualties.persons_killed.is_some()
}

/// Whether the record is fully placed: an attributed borough, both
/// coordinates, and location text.
#[must_use]
pub const fn is_fully_located(record: &CrashRecord) -> bool {
    record.borough.is_some()
        && record.longitude.is_some()
        && record.latitude.is_some()
        && record.location.is_some()
}

/// Drops unlocated records, then applies the configured completeness
/// filters.
#[must_use]
pub fn apply_row_filters(records: Vec<CrashRecord>, config: &FilterConfig) -> Vec<CrashRecord> {
    let before = records.len();
    let mut sentinel = 0usize;
    let mut unlocated = 0usize;
    let mut incomplete = 0usize;
    let mut unplaced = 0usize;

    let kept: Vec<CrashRecord> = records
        .into_iter()
        .filter(|r| {
            if has_sentinel_location(r) {
                sentinel += 1;
                false
            } else if !has_location_signal(r) {
                unlocated += 1;
                false
            } else if config.require_complete_casualties && !has_complete_casualties(r) {
                incomplete += 1;
                false
            } else if config.require_borough && !is_fully_located(r) {
                unplaced += 1;
                false
            } else {
                true
            }
        })
        .collect();

    log::info!(
        "Row filters kept {} of {before} records \
         (dropped {sentinel} placeholder points, {unlocated} without any location, \
         {incomplete} incomplete, {unplaced} without borough or coordinates)",
        kept.len()
    );
    kept
}
