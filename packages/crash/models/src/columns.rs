//! Canonical column names of the collision feed after header normalization.

use crate::VEHICLE_SLOTS;

pub const COLLISION_ID: &str = "collision_id";
pub const CRASH_DATE: &str = "crash_date";
pub const CRASH_TIME: &str = "crash_time";
pub const BOROUGH: &str = "borough";
pub const ZIP_CODE: &str = "zip_code";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const LOCATION: &str = "location";
pub const ON_STREET_NAME: &str = "on_street_name";
pub const CROSS_STREET_NAME: &str = "cross_street_name";
pub const OFF_STREET_NAME: &str = "off_street_name";
pub const PERSONS_INJURED: &str = "number_of_persons_injured";
pub const PERSONS_KILLED: &str = "number_of_persons_killed";
pub const PEDESTRIANS_INJURED: &str = "number_of_pedestrians_injured";
pub const PEDESTRIANS_KILLED: &str = "number_of_pedestrians_killed";
pub const CYCLISTS_INJURED: &str = "number_of_cyclist_injured";
pub const CYCLISTS_KILLED: &str = "number_of_cyclist_killed";
pub const MOTORISTS_INJURED: &str = "number_of_motorist_injured";
pub const MOTORISTS_KILLED: &str = "number_of_motorist_killed";

/// Columns every input file must carry.
pub const REQUIRED: &[&str] = &[
    COLLISION_ID,
    CRASH_DATE,
    CRASH_TIME,
    BOROUGH,
    ZIP_CODE,
    LATITUDE,
    LONGITUDE,
    LOCATION,
    ON_STREET_NAME,
    CROSS_STREET_NAME,
    PERSONS_INJURED,
    PERSONS_KILLED,
];

/// `contributing_factor_vehicle_{slot}` for slots `1..=5`.
#[must_use]
pub fn contributing_factor(slot: usize) -> String {
    format!("contributing_factor_vehicle_{slot}")
}

/// `vehicle_type_code_{slot}` for slots `1..=5`.
#[must_use]
pub fn vehicle_type(slot: usize) -> String {
    format!("vehicle_type_code_{slot}")
}

/// All contributing-factor column names in slot order.
#[must_use]
pub fn contributing_factors() -> Vec<String> {
    (1..=VEHICLE_SLOTS).map(contributing_factor).collect()
}

/// All vehicle-type column names in slot order.
#[must_use]
pub fn vehicle_types() -> Vec<String> {
    (1..=VEHICLE_SLOTS).map(vehicle_type).collect()
}

/// Rewrites a raw header into the lower-case, underscore-delimited form.
///
/// `"CRASH DATE"` becomes `"crash_date"`.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_name("CRASH DATE"), "crash_date");
        assert_eq!(
            normalize_name(" NUMBER OF PERSONS INJURED "),
            "number_of_persons_injured"
        );
        assert_eq!(normalize_name("collision_id"), "collision_id");
    }

    #[test]
    fn slot_columns_are_one_based() {
        assert_eq!(contributing_factors()[0], "contributing_factor_vehicle_1");
        assert_eq!(vehicle_types()[4], "vehicle_type_code_5");
    }
}
