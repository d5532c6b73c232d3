#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Collision record types shared across the crash map pipeline.
//!
//! Defines the typed [`CrashRecord`] produced by normalization, the
//! categorical domains it is coerced into ([`Borough`], [`Severity`],
//! [`LocationType`]), and the holiday types joined onto it.

pub mod columns;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of contributing-factor and vehicle-type slots per collision.
pub const VEHICLE_SLOTS: usize = 5;

/// One of the five administrative regions used to bucket collisions.
///
/// Parsing is case-insensitive so both the raw `BROOKLYN` spelling from the
/// collision feed and the `Brooklyn` spelling from the boundary file map to
/// the same variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "title_case", ascii_case_insensitive)]
pub enum Borough {
    Bronx,
    Brooklyn,
    Manhattan,
    Queens,
    #[serde(rename = "Staten Island")]
    StatenIsland,
}

impl Borough {
    /// Coerces a raw text value into the borough domain.
    ///
    /// Returns `None` for blank or unrecognized values.
    #[must_use]
    pub fn coerce(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse().ok()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Bronx,
            Self::Brooklyn,
            Self::Manhattan,
            Self::Queens,
            Self::StatenIsland,
        ]
    }
}

/// Worst outcome of a collision.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "title_case")]
pub enum Severity {
    /// At least one person was killed.
    Fatal,
    /// Nobody was killed but at least one person was injured.
    Injury,
    /// Nobody was killed or injured.
    #[serde(rename = "No Casualty")]
    NoCasualty,
}

impl Severity {
    /// Classifies a collision from its casualty totals.
    #[must_use]
    pub const fn classify(total_killed: u32, total_injured: u32) -> Self {
        if total_killed > 0 {
            Self::Fatal
        } else if total_injured > 0 {
            Self::Injury
        } else {
            Self::NoCasualty
        }
    }
}

/// Where on the street network a collision happened.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationType {
    /// Both an on-street and a cross-street name were recorded.
    Intersection,
    /// Only an on-street name was recorded.
    MidBlock,
    /// No on-street name (parking lots, driveways, ...).
    OffStreet,
    Unknown,
}

impl LocationType {
    /// Classifies a collision from which street names are present.
    ///
    /// Once the on-street name is absent the cross-street is ignored, so a
    /// record with only a cross-street is still `OffStreet`.
    #[must_use]
    pub const fn classify(has_on_street: bool, has_cross_street: bool) -> Self {
        match (has_on_street, has_cross_street) {
            (true, true) => Self::Intersection,
            (true, false) => Self::MidBlock,
            (false, _) => Self::OffStreet,
        }
    }
}

/// Injury and fatality counts by road-user category.
///
/// Every count is nullable; the source feed leaves some of them blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Casualties {
    pub persons_injured: Option<u32>,
    pub persons_killed: Option<u32>,
    pub pedestrians_injured: Option<u32>,
    pub pedestrians_killed: Option<u32>,
    pub cyclists_injured: Option<u32>,
    pub cyclists_killed: Option<u32>,
    pub motorists_injured: Option<u32>,
    pub motorists_killed: Option<u32>,
}

impl Casualties {
    /// All injury-count columns, in column order.
    #[must_use]
    pub const fn injured_counts(&self) -> [Option<u32>; 4] {
        [
            self.persons_injured,
            self.pedestrians_injured,
            self.cyclists_injured,
            self.motorists_injured,
        ]
    }

    /// All fatality-count columns, in column order.
    #[must_use]
    pub const fn killed_counts(&self) -> [Option<u32>; 4] {
        [
            self.persons_killed,
            self.pedestrians_killed,
            self.cyclists_killed,
            self.motorists_killed,
        ]
    }
}

/// Metrics computed from a record's already-cleansed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total_injured: u32,
    pub total_killed: u32,
    pub severity: Severity,
    /// Number of non-null vehicle-type slots (0-5).
    pub involved_vehicle_count: u8,
    pub location_type: LocationType,
}

/// A single reported collision after normalization.
///
/// Fields that failed to parse are `None` rather than aborting the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrashRecord {
    pub collision_id: String,
    pub crash_date: Option<NaiveDate>,
    pub crash_time: Option<NaiveTime>,
    pub crash_hour: Option<u32>,
    /// Day-of-week name, e.g. `"Monday"`.
    pub crash_day: Option<String>,
    /// Month name, e.g. `"January"`.
    pub crash_month: Option<String>,
    pub crash_year: Option<i32>,
    /// Borough as reported by the feed. Only used to tell whether a row
    /// carries any location at all.
    pub raw_borough: Option<Borough>,
    /// Borough whose boundary contains the point; `None` until enrichment
    /// and for points outside every boundary.
    pub borough: Option<Borough>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Raw `"(lat, lng)"` location text from the feed.
    pub location: Option<String>,
    pub on_street_name: Option<String>,
    pub cross_street_name: Option<String>,
    pub off_street_name: Option<String>,
    pub casualties: Casualties,
    pub contributing_factors: [Option<String>; VEHICLE_SLOTS],
    pub vehicle_types: [Option<String>; VEHICLE_SLOTS],
    /// Populated by the metrics step; `None` until then.
    pub metrics: Option<DerivedMetrics>,
}

impl CrashRecord {
    /// Returns the coordinate pair when both halves are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.longitude, self.latitude) {
            (Some(lng), Some(lat)) => Some((lng, lat)),
            _ => None,
        }
    }
}

/// A public holiday after jurisdiction filtering and date deduplication.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HolidayRecord {
    pub holiday_date: NaiveDate,
    /// One name, or several joined by `" / "` when holidays share a date.
    pub holiday_name: String,
}

/// A collision left-joined with the holiday table on date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub crash: CrashRecord,
    pub holiday_name: Option<String>,
    pub is_public_holiday: bool,
}
