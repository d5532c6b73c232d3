//! Borough attribution by point-in-polygon lookup.

use crash_map_crash_models::{Borough, CrashRecord};
use crash_map_spatial::BoroughIndex;

/// What happened to one record during enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
    /// The point fell inside a boundary.
    Matched(Borough),
    /// The point fell outside every boundary.
    Unmatched,
    /// The record has no coordinate pair.
    NoCoordinates,
}

/// Sets the record's borough to the boundary containing its point.
///
/// The borough is only ever the spatial match: a point outside every
/// boundary, or a record without coordinates, gets `None` whatever the feed
/// reported. The feed's value stays in `raw_borough`.
pub fn enrich_borough(record: &mut CrashRecord, index: &BoroughIndex) -> Attribution {
    let matched = record
        .coordinates()
        .map(|(lng, lat)| index.lookup(lng, lat));
    record.borough = matched.flatten();

    match matched {
        Some(Some(borough)) => Attribution::Matched(borough),
        Some(None) => Attribution::Unmatched,
        None => Attribution::NoCoordinates,
    }
}

/// Counts of each [`Attribution`] over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub matched: usize,
    /// Matches that disagree with a non-null raw borough.
    pub corrected: usize,
    pub unmatched: usize,
    pub no_coordinates: usize,
}

/// Enriches every record in place. No record is added or removed.
pub fn enrich_all(records: &mut [CrashRecord], index: &BoroughIndex) -> EnrichmentStats {
    let mut stats = EnrichmentStats::default();

    for record in records.iter_mut() {
        match enrich_borough(record, index) {
            Attribution::Matched(borough) => {
                stats.matched += 1;
                if record.raw_borough.is_some_and(|b| b != borough) {
                    stats.corrected += 1;
                }
            }
            Attribution::Unmatched => stats.unmatched += 1,
            Attribution::NoCoordinates => stats.no_coordinates += 1,
        }
    }

    log::info!(
        "Borough enrichment: {} matched ({} corrected), {} outside all boundaries, {} without coordinates",
        stats.matched,
        stats.corrected,
        stats.unmatched,
        stats.no_coordinates
    );
    stats
}
