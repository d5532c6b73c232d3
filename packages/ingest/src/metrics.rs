//! Derived per-record metrics. Every function here is pure.

use crash_map_crash_models::{CrashRecord, DerivedMetrics, LocationType, Severity};

/// Number of non-null vehicle-type slots.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn involved_vehicle_count(record: &CrashRecord) -> u8 {
    record.vehicle_types.iter().filter(|v| v.is_some()).count() as u8
}

/// Sum of every injury column, treating nulls as zero.
#[must_use]
pub fn total_injured(record: &CrashRecord) -> u32 {
    sum(record.casualties.injured_counts())
}

/// Sum of every fatality column, treating nulls as zero.
#[must_use]
pub fn total_killed(record: &CrashRecord) -> u32 {
    sum(record.casualties.killed_counts())
}

fn sum(counts: [Option<u32>; 4]) -> u32 {
    counts
        .into_iter()
        .flatten()
        .fold(0u32, u32::saturating_add)
}

#[must_use]
pub const fn location_type(record: &CrashRecord) -> LocationType {
    LocationType::classify(
        record.on_street_name.is_some(),
        record.cross_street_name.is_some(),
    )
}

/// Computes all derived metrics for a record.
#[must_use]
pub fn derive_metrics(record: &CrashRecord) -> DerivedMetrics {
    let total_injured = total_injured(record);
    let total_killed = total_killed(record);

    DerivedMetrics {
        total_injured,
        total_killed,
        severity: Severity::classify(total_killed, total_injured),
        involved_vehicle_count: involved_vehicle_count(record),
        location_type: location_type(record),
    }
}

/// Stores freshly derived metrics on every record.
pub fn apply_metrics(records: &mut [CrashRecord]) {
    for record in records.iter_mut() {
        record.metrics = Some(derive_metrics(record));
    }
}
