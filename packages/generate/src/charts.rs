//! Chart aggregations over the merged table, written as CSV.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike as _, Month};
use crash_map_crash_models::MergedRecord;
use serde::Serialize;

use crate::ExportError;

pub const COLLISIONS_BY_YEAR: &str = "collisions_by_year.csv";
pub const COLLISIONS_BY_HOLIDAY: &str = "collisions_by_holiday.csv";
pub const AVERAGE_COLLISIONS_BY_HOLIDAY: &str = "average_collisions_by_holiday.csv";
pub const COLLISIONS_BY_MONTH: &str = "collisions_by_month.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub crash_year: i32,
    pub collision_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolidayCount {
    pub holiday_name: String,
    pub collision_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolidayAverage {
    pub holiday_name: String,
    /// Mean collisions per year, over the years the holiday has collisions.
    pub average_collisions: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub crash_year: i32,
    pub month: u32,
    pub month_name: String,
    pub collision_count: usize,
}

/// Collisions per crash year, oldest first.
#[must_use]
pub fn collisions_by_year(records: &[MergedRecord]) -> Vec<YearCount> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for year in records.iter().filter_map(|r| r.crash.crash_year) {
        *counts.entry(year).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(crash_year, collision_count)| YearCount {
            crash_year,
            collision_count,
        })
        .collect()
}

fn holiday_records(records: &[MergedRecord]) -> impl Iterator<Item = (&str, &MergedRecord)> {
    records
        .iter()
        .filter_map(|r| r.holiday_name.as_deref().map(|name| (name, r)))
}

/// Collisions per holiday, most first. Ties keep name order.
#[must_use]
pub fn collisions_by_holiday(records: &[MergedRecord]) -> Vec<HolidayCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (name, _) in holiday_records(records) {
        *counts.entry(name).or_default() += 1;
    }

    let mut rows: Vec<HolidayCount> = counts
        .into_iter()
        .map(|(name, collision_count)| HolidayCount {
            holiday_name: name.to_string(),
            collision_count,
        })
        .collect();
    rows.sort_by(|a, b| b.collision_count.cmp(&a.collision_count));
    rows
}

/// Mean collisions per year for each holiday, highest first. Ties keep
/// name order.
///
/// Normalizes for holidays that appear in fewer years of the window.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_collisions_by_holiday(records: &[MergedRecord]) -> Vec<HolidayAverage> {
    let mut per_year: BTreeMap<&str, BTreeMap<i32, usize>> = BTreeMap::new();
    for (name, record) in holiday_records(records) {
        if let Some(year) = record.crash.crash_year {
            *per_year.entry(name).or_default().entry(year).or_default() += 1;
        }
    }

    let mut rows: Vec<HolidayAverage> = per_year
        .into_iter()
        .map(|(name, years)| {
            let total: usize = years.values().sum();
            HolidayAverage {
                holiday_name: name.to_string(),
                average_collisions: total as f64 / years.len() as f64,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.average_collisions.total_cmp(&a.average_collisions));
    rows
}

/// Collisions per calendar month, chronologically.
///
/// Every month of each year with data is listed, with zero counts for
/// months without collisions.
#[must_use]
pub fn collisions_by_month(records: &[MergedRecord]) -> Vec<MonthCount> {
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for date in records.iter().filter_map(|r| r.crash.crash_date) {
        *counts.entry((date.year(), date.month())).or_default() += 1;
    }

    let mut years: Vec<i32> = counts.keys().map(|(year, _)| *year).collect();
    years.dedup();

    years
        .into_iter()
        .flat_map(|year| (1..=12u32).map(move |month| (year, month)))
        .map(|(crash_year, month)| MonthCount {
            crash_year,
            month,
            month_name: month_name(month),
            collision_count: counts.get(&(crash_year, month)).copied().unwrap_or(0),
        })
        .collect()
}

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or_else(String::new, |m| m.name().to_string())
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes all four chart aggregations into `dir`.
///
/// # Errors
///
/// Returns [`ExportError`] if the directory or any file cannot be written.
pub fn write_chart_data(records: &[MergedRecord], dir: &Path) -> Result<usize, ExportError> {
    std::fs::create_dir_all(dir)?;

    write_csv(&dir.join(COLLISIONS_BY_YEAR), &collisions_by_year(records))?;
    write_csv(&dir.join(COLLISIONS_BY_HOLIDAY), &collisions_by_holiday(records))?;
    write_csv(
        &dir.join(AVERAGE_COLLISIONS_BY_HOLIDAY),
        &average_collisions_by_holiday(records),
    )?;
    write_csv(&dir.join(COLLISIONS_BY_MONTH), &collisions_by_month(records))?;

    log::info!("Chart data written to {}", dir.display());
    Ok(4)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crash_map_crash_models::CrashRecord;

    use super::*;

    fn record(y: i32, m: u32, d: u32, holiday: Option<&str>) -> MergedRecord {
        let crash_date = NaiveDate::from_ymd_opt(y, m, d);
        MergedRecord {
            crash: CrashRecord {
                crash_date,
                crash_year: Some(y),
                ..CrashRecord::default()
            },
            holiday_name: holiday.map(str::to_string),
            is_public_holiday: holiday.is_some(),
        }
    }

    fn sample() -> Vec<MergedRecord> {
        vec![
            record(2022, 1, 1, Some("New Year's Day")),
            record(2022, 1, 1, Some("New Year's Day")),
            record(2022, 1, 1, Some("New Year's Day")),
            record(2023, 1, 1, Some("New Year's Day")),
            record(2023, 7, 4, Some("Independence Day")),
            record(2023, 7, 4, Some("Independence Day")),
            record(2023, 3, 9, None),
        ]
    }

    #[test]
    fn counts_by_year() {
        assert_eq!(
            collisions_by_year(&sample()),
            vec![
                YearCount {
                    crash_year: 2022,
                    collision_count: 3
                },
                YearCount {
                    crash_year: 2023,
                    collision_count: 4
                },
            ]
        );
    }

    #[test]
    fn counts_by_holiday_descending() {
        let rows = collisions_by_holiday(&sample());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].holiday_name, "New Year's Day");
        assert_eq!(rows[0].collision_count, 4);
        assert_eq!(rows[1].collision_count, 2);
    }

    #[test]
    fn averages_over_years_present() {
        // New Year's Day: 3 + 1 over two years; Independence Day: 2 over one.
        let rows = average_collisions_by_holiday(&sample());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| (r.average_collisions - 2.0).abs() < f64::EPSILON));
        // Ties keep name order.
        assert_eq!(rows[0].holiday_name, "Independence Day");
    }

    #[test]
    fn months_are_chronological_with_zero_fill() {
        let rows = collisions_by_month(&sample());
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0].month_name, "January");
        assert_eq!(rows[0].collision_count, 3);
        assert_eq!(rows[1].collision_count, 0);
        let july_2023 = &rows[12 + 6];
        assert_eq!((july_2023.crash_year, july_2023.month), (2023, 7));
        assert_eq!(july_2023.collision_count, 2);
    }

    #[test]
    fn writes_all_chart_files() {
        let dir = std::env::temp_dir().join("crash_map_charts_test");
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(write_chart_data(&sample(), &dir).unwrap(), 4);

        let by_year = std::fs::read_to_string(dir.join(COLLISIONS_BY_YEAR)).unwrap();
        assert_eq!(by_year, "crash_year,collision_count\n2022,3\n2023,4\n");
        for file in [
            COLLISIONS_BY_HOLIDAY,
            AVERAGE_COLLISIONS_BY_HOLIDAY,
            COLLISIONS_BY_MONTH,
        ] {
            assert!(dir.join(file).exists());
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
