//! Data profiling logged between stages. Profiling never changes the data.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use crash_map_crash_models::{CrashRecord, MergedRecord, columns};

/// Number of most frequent values logged per column.
pub const TOP_VALUES: usize = 20;

type Accessor = fn(&CrashRecord) -> Option<String>;

fn display<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Borough as reported by the feed, before spatial attribution.
pub const RAW_BOROUGH: &str = "raw_borough";

/// Profiled columns, by normalized column name.
const COLUMNS: &[(&str, Accessor)] = &[
    (columns::CRASH_DATE, |r| display(r.crash_date)),
    (columns::CRASH_TIME, |r| display(r.crash_time)),
    (RAW_BOROUGH, |r| display(r.raw_borough)),
    (columns::BOROUGH, |r| display(r.borough)),
    (columns::ZIP_CODE, |r| r.zip_code.clone()),
    (columns::LATITUDE, |r| display(r.latitude)),
    (columns::LONGITUDE, |r| display(r.longitude)),
    (columns::LOCATION, |r| r.location.clone()),
    (columns::ON_STREET_NAME, |r| r.on_street_name.clone()),
    (columns::CROSS_STREET_NAME, |r| r.cross_street_name.clone()),
    (columns::OFF_STREET_NAME, |r| r.off_street_name.clone()),
    (columns::PERSONS_INJURED, |r| display(r.casualties.persons_injured)),
    (columns::PERSONS_KILLED, |r| display(r.casualties.persons_killed)),
    (columns::PEDESTRIANS_INJURED, |r| display(r.casualties.pedestrians_injured)),
    (columns::PEDESTRIANS_KILLED, |r| display(r.casualties.pedestrians_killed)),
    (columns::CYCLISTS_INJURED, |r| display(r.casualties.cyclists_injured)),
    (columns::CYCLISTS_KILLED, |r| display(r.casualties.cyclists_killed)),
    (columns::MOTORISTS_INJURED, |r| display(r.casualties.motorists_injured)),
    (columns::MOTORISTS_KILLED, |r| display(r.casualties.motorists_killed)),
    ("contributing_factor_vehicle_1", |r| r.contributing_factors[0].clone()),
    ("contributing_factor_vehicle_2", |r| r.contributing_factors[1].clone()),
    ("contributing_factor_vehicle_3", |r| r.contributing_factors[2].clone()),
    ("contributing_factor_vehicle_4", |r| r.contributing_factors[3].clone()),
    ("contributing_factor_vehicle_5", |r| r.contributing_factors[4].clone()),
    ("vehicle_type_code_1", |r| r.vehicle_types[0].clone()),
    ("vehicle_type_code_2", |r| r.vehicle_types[1].clone()),
    ("vehicle_type_code_3", |r| r.vehicle_types[2].clone()),
    ("vehicle_type_code_4", |r| r.vehicle_types[3].clone()),
    ("vehicle_type_code_5", |r| r.vehicle_types[4].clone()),
];

/// Summary statistics of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub rows: usize,
    pub earliest_crash_date: Option<NaiveDate>,
    /// `(column, null percentage)`, highest first.
    pub null_percentages: Vec<(&'static str, f64)>,
    /// Most frequent values of the requested columns, most frequent first.
    pub top_values: BTreeMap<&'static str, Vec<(String, usize)>>,
}

/// Profiles a batch of collisions.
///
/// `value_columns` names the columns whose most frequent values are
/// counted; unknown names are ignored.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn profile<'a>(
    records: impl IntoIterator<Item = &'a CrashRecord>,
    value_columns: &[&str],
) -> Profile {
    let mut rows = 0usize;
    let mut earliest_crash_date: Option<NaiveDate> = None;
    let mut nulls = vec![0usize; COLUMNS.len()];
    let mut counts: BTreeMap<&'static str, BTreeMap<String, usize>> = BTreeMap::new();

    for record in records {
        rows += 1;
        if let Some(date) = record.crash_date {
            earliest_crash_date = Some(earliest_crash_date.map_or(date, |e| e.min(date)));
        }
        for (i, (name, accessor)) in COLUMNS.iter().enumerate() {
            match accessor(record) {
                None => nulls[i] += 1,
                Some(value) if value_columns.contains(name) => {
                    *counts.entry(*name).or_default().entry(value).or_default() += 1;
                }
                Some(_) => {}
            }
        }
    }

    let mut null_percentages: Vec<(&'static str, f64)> = COLUMNS
        .iter()
        .zip(&nulls)
        .map(|((name, _), &n)| {
            let pct = if rows == 0 {
                0.0
            } else {
                n as f64 * 100.0 / rows as f64
            };
            (*name, pct)
        })
        .collect();
    null_percentages.sort_by(|a, b| b.1.total_cmp(&a.1));

    let top_values = counts
        .into_iter()
        .map(|(name, values)| {
            let mut values: Vec<(String, usize)> = values.into_iter().collect();
            values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            values.truncate(TOP_VALUES);
            (name, values)
        })
        .collect();

    Profile {
        rows,
        earliest_crash_date,
        null_percentages,
        top_values,
    }
}

/// Profiles and logs a batch of collisions under `label`.
pub fn log_profile<'a>(
    label: &str,
    records: impl IntoIterator<Item = &'a CrashRecord>,
    value_columns: &[&str],
) -> Profile {
    let profile = profile(records, value_columns);

    log::info!("{label}: {} rows", profile.rows);
    if let Some(earliest) = profile.earliest_crash_date {
        log::info!("{label}: earliest crash date {earliest}");
    }
    for (column, pct) in &profile.null_percentages {
        log::debug!("{label}: {column} {pct:.2}% missing");
    }
    for (column, values) in &profile.top_values {
        log::debug!("{label}: top values of {column}: {values:?}");
    }

    profile
}

/// Profiles merged records, also logging the holiday share.
pub fn log_merged_profile(label: &str, records: &[MergedRecord]) -> Profile {
    let on_holidays = records.iter().filter(|r| r.is_public_holiday).count();
    log::info!("{label}: {on_holidays} collisions on public holidays");
    log_profile(label, records.iter().map(|r| &r.crash), &[columns::BOROUGH])
}
