#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Public holiday reference data.
//!
//! Fetches one year of holidays at a time through a [`HolidaySource`],
//! filters them to a single jurisdiction (plus nationwide holidays), and
//! collapses holidays sharing a date into one [`HolidayRecord`].

pub mod nager;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use crash_map_crash_models::HolidayRecord;
use serde::{Deserialize, Serialize};

/// Separator placed between holiday names that fall on the same date.
pub const NAME_SEPARATOR: &str = " / ";

/// Errors that can occur while fetching holidays.
#[derive(Debug, thiserror::Error)]
pub enum HolidayError {
    /// HTTP request failed (connection, timeout, or error status).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A holiday as returned by the upstream feed, before any cleansing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHoliday {
    pub date: NaiveDate,
    pub local_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub global: bool,
    /// Subdivision codes (e.g. `"US-NY"`) the holiday applies to, or `None`
    /// when it applies everywhere.
    #[serde(default)]
    pub counties: Option<Vec<String>>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl RawHoliday {
    /// Whether this holiday is observed in the given jurisdiction.
    ///
    /// Holidays with no subdivision list, or flagged as global, apply
    /// everywhere.
    #[must_use]
    pub fn applies_to(&self, jurisdiction: &str) -> bool {
        if self.global {
            return true;
        }
        self.counties.as_ref().is_none_or(|counties| {
            counties
                .iter()
                .any(|county| county.contains(jurisdiction))
        })
    }
}

/// A provider of holidays for one calendar year.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    /// Fetches every holiday in `year`.
    ///
    /// An empty list means the provider has no data for that year.
    ///
    /// # Errors
    ///
    /// Returns [`HolidayError`] if the request or response parsing fails.
    async fn fetch_year(&self, year: i32) -> Result<Vec<RawHoliday>, HolidayError>;
}

/// Fetches holidays for `start_year` and the `window` years before it.
///
/// Years are fetched newest first. A failed year is logged and treated as
/// empty, and the first empty year stops extraction: the provider is
/// assumed to have no data further back.
pub async fn extract_all_holidays(
    source: &dyn HolidaySource,
    start_year: i32,
    window: u32,
) -> Vec<RawHoliday> {
    let mut all = Vec::new();

    for offset in 0..=window {
        let Some(year) = i32::try_from(offset)
            .ok()
            .and_then(|offset| start_year.checked_sub(offset))
        else {
            break;
        };

        let yearly = match source.fetch_year(year).await {
            Ok(holidays) => holidays,
            Err(e) => {
                log::error!("Failed to fetch holidays for {year}: {e}");
                Vec::new()
            }
        };

        if yearly.is_empty() {
            log::info!(
                "No holidays returned for {year}; assuming the provider's range ends here"
            );
            break;
        }

        log::info!("Fetched {} holidays for {year}", yearly.len());
        all.extend(yearly);
    }

    all
}

/// Filters raw holidays to a jurisdiction and collapses shared dates.
///
/// Names falling on the same date are deduplicated, sorted, and joined
/// with [`NAME_SEPARATOR`]. The result is sorted by date and every date is
/// unique.
#[must_use]
pub fn clean_and_transform(raw: &[RawHoliday], jurisdiction: &str) -> Vec<HolidayRecord> {
    if raw.is_empty() {
        log::warn!("No holidays to clean");
        return Vec::new();
    }

    let (kept, dropped): (Vec<&RawHoliday>, Vec<&RawHoliday>) =
        raw.iter().partition(|h| h.applies_to(jurisdiction));

    log::info!(
        "Kept {} holidays observed in {jurisdiction}, dropped {} for other subdivisions",
        kept.len(),
        dropped.len()
    );
    for holiday in &dropped {
        log::debug!(
            "Dropped {} on {} (counties: {:?})",
            holiday.local_name,
            holiday.date,
            holiday.counties
        );
    }

    let mut by_date: BTreeMap<NaiveDate, BTreeSet<&str>> = BTreeMap::new();
    for holiday in &kept {
        by_date
            .entry(holiday.date)
            .or_default()
            .insert(holiday.local_name.as_str());
    }

    if by_date.len() < kept.len() {
        log::warn!(
            "Duplicate dates detected: {} holidays share {} dates",
            kept.len(),
            by_date.len()
        );
    }

    by_date
        .into_iter()
        .map(|(holiday_date, names)| HolidayRecord {
            holiday_date,
            holiday_name: names.into_iter().collect::<Vec<_>>().join(NAME_SEPARATOR),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn holiday(date: &str, name: &str, global: bool, counties: Option<&[&str]>) -> RawHoliday {
        RawHoliday {
            date: date.parse().unwrap(),
            local_name: name.to_string(),
            name: name.to_string(),
            country_code: "US".to_string(),
            global,
            counties: counties.map(|c| c.iter().map(ToString::to_string).collect()),
            types: vec!["Public".to_string()],
        }
    }

    #[test]
    fn collapses_shared_dates_alphabetically() {
        let raw = vec![
            holiday("2024-01-01", "Some Other Holiday", true, None),
            holiday("2024-01-01", "New Year's Day", true, None),
        ];
        let cleaned = clean_and_transform(&raw, "US-NY");
        assert_eq!(cleaned.len(), 1);
        assert_eq!(
            cleaned[0].holiday_name,
            "New Year's Day / Some Other Holiday"
        );
        assert_eq!(cleaned[0].holiday_date, "2024-01-01".parse().unwrap());
    }

    #[test]
    fn deduplicates_identical_names() {
        let raw = vec![
            holiday("2024-07-04", "Independence Day", true, None),
            holiday("2024-07-04", "Independence Day", false, None),
        ];
        let cleaned = clean_and_transform(&raw, "US-NY");
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].holiday_name, "Independence Day");
    }

    #[test]
    fn filters_to_jurisdiction() {
        let raw = vec![
            holiday("2024-02-12", "Lincoln's Birthday", false, Some(&["US-NY", "US-CT"])),
            holiday("2024-03-04", "Casimir Pulaski Day", false, Some(&["US-IL"])),
            holiday("2024-05-27", "Memorial Day", true, None),
            holiday("2024-10-14", "Columbus Day", false, None),
        ];
        let cleaned = clean_and_transform(&raw, "US-NY");
        let names: Vec<&str> = cleaned.iter().map(|h| h.holiday_name.as_str()).collect();
        assert_eq!(names, ["Lincoln's Birthday", "Memorial Day", "Columbus Day"]);
    }

    #[test]
    fn output_dates_are_sorted_and_unique() {
        let raw = vec![
            holiday("2024-12-25", "Christmas Day", true, None),
            holiday("2023-12-25", "Christmas Day", true, None),
            holiday("2024-01-01", "New Year's Day", true, None),
        ];
        let cleaned = clean_and_transform(&raw, "US-NY");
        let dates: Vec<NaiveDate> = cleaned.iter().map(|h| h.holiday_date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn empty_input_yields_empty_table() {
        assert!(clean_and_transform(&[], "US-NY").is_empty());
    }

    #[test]
    fn parses_feed_json() {
        let body = r#"[{
            "date": "2024-01-15",
            "localName": "Martin Luther King, Jr. Day",
            "name": "Martin Luther King, Jr. Day",
            "countryCode": "US",
            "fixed": false,
            "global": true,
            "counties": null,
            "launchYear": null,
            "types": ["Public"]
        }]"#;
        let parsed: Vec<RawHoliday> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed[0].local_name, "Martin Luther King, Jr. Day");
        assert!(parsed[0].global);
        assert!(parsed[0].counties.is_none());
    }

    /// Serves canned years; missing years come back empty and years in
    /// `failing` return an error.
    struct StaticSource {
        years: BTreeMap<i32, Vec<RawHoliday>>,
        failing: Vec<i32>,
    }

    #[async_trait]
    impl HolidaySource for StaticSource {
        async fn fetch_year(&self, year: i32) -> Result<Vec<RawHoliday>, HolidayError> {
            if self.failing.contains(&year) {
                return Err(serde_json::from_str::<Vec<RawHoliday>>("not json")
                    .unwrap_err()
                    .into());
            }
            Ok(self.years.get(&year).cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn extracts_trailing_years() {
        let source = StaticSource {
            years: BTreeMap::from([
                (2024, vec![holiday("2024-01-01", "New Year's Day", true, None)]),
                (2023, vec![holiday("2023-01-01", "New Year's Day", true, None)]),
                (2022, vec![holiday("2022-01-01", "New Year's Day", true, None)]),
            ]),
            failing: vec![],
        };
        let all = extract_all_holidays(&source, 2024, 1).await;
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn stops_at_first_empty_year() {
        let source = StaticSource {
            years: BTreeMap::from([
                (2024, vec![holiday("2024-01-01", "New Year's Day", true, None)]),
                (2022, vec![holiday("2022-01-01", "New Year's Day", true, None)]),
            ]),
            failing: vec![],
        };
        let all = extract_all_holidays(&source, 2024, 5).await;
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn failed_year_stops_extraction() {
        let source = StaticSource {
            years: BTreeMap::from([
                (2024, vec![holiday("2024-01-01", "New Year's Day", true, None)]),
                (2022, vec![holiday("2022-01-01", "New Year's Day", true, None)]),
            ]),
            failing: vec![2023],
        };
        let all = extract_all_holidays(&source, 2024, 5).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].date, "2024-01-01".parse().unwrap());
    }
}
