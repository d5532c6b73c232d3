#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Star-schema decomposition of the cleansed collision table.
//!
//! Contributing factors, vehicle types, and boroughs are pulled out into
//! [`Dimension`] tables with dense surrogate ids; the remaining columns stay
//! on the fact rows alongside `<column>_id` foreign keys.

use std::collections::{BTreeMap, BTreeSet};

use crash_map_crash_models::{MergedRecord, VEHICLE_SLOTS};

/// A deduplicated set of categorical values with surrogate ids.
///
/// Ids are assigned from 1 in case-insensitive alphabetical order of the
/// trimmed values, so the same input values always produce the same ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dimension {
    values: Vec<String>,
    ids: BTreeMap<String, u32>,
}

impl Dimension {
    /// Builds a dimension from every value of the source columns.
    ///
    /// Nulls and values that are blank after trimming are ignored.
    #[must_use]
    pub fn build<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let distinct: BTreeSet<&str> = values
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();

        let mut values: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        // BTreeSet order already breaks case-insensitive ties by byte order.
        values.sort_by_cached_key(|v| v.to_lowercase());

        let ids = values
            .iter()
            .zip(1u32..)
            .map(|(value, id)| (value.clone(), id))
            .collect();

        Self { values, ids }
    }

    /// Surrogate id for a source value, or `None` for null/unmapped values.
    #[must_use]
    pub fn id_of(&self, value: Option<&str>) -> Option<u32> {
        self.ids.get(value?.trim()).copied()
    }

    /// `(id, description)` pairs in id order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &str)> {
        (1u32..).zip(self.values.iter().map(String::as_str))
    }

    /// Number of distinct values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the dimension holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A collision with its dimensionalized text columns replaced by ids.
///
/// The contributing-factor, vehicle-type, and borough fields of `record`
/// are cleared; everything else is carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub record: MergedRecord,
    pub contributing_factor_ids: [Option<u32>; VEHICLE_SLOTS],
    pub vehicle_type_ids: [Option<u32>; VEHICLE_SLOTS],
    pub borough_id: Option<u32>,
}

/// The fact table plus its three dimensions.
#[derive(Debug, Clone, Default)]
pub struct DataModel {
    pub facts: Vec<FactRow>,
    pub contributing_factors: Dimension,
    pub vehicle_types: Dimension,
    pub boroughs: Dimension,
}

/// Decomposes the wide merged table into facts and dimensions.
#[must_use]
pub fn build_data_model(records: Vec<MergedRecord>) -> DataModel {
    let contributing_factors = Dimension::build(records.iter().flat_map(|r| {
        r.crash
            .contributing_factors
            .iter()
            .map(Option::as_deref)
    }));
    let vehicle_types = Dimension::build(
        records
            .iter()
            .flat_map(|r| r.crash.vehicle_types.iter().map(Option::as_deref)),
    );
    let borough_names: Vec<Option<String>> = records
        .iter()
        .map(|r| r.crash.borough.map(|b| b.to_string()))
        .collect();
    let boroughs = Dimension::build(borough_names.iter().map(Option::as_deref));

    log::info!(
        "Built dimensions: {} contributing factors, {} vehicle types, {} boroughs",
        contributing_factors.len(),
        vehicle_types.len(),
        boroughs.len()
    );

    let facts = records
        .into_iter()
        .zip(borough_names)
        .map(|(mut record, borough_name)| {
            let factors = std::mem::take(&mut record.crash.contributing_factors);
            let vehicles = std::mem::take(&mut record.crash.vehicle_types);
            record.crash.borough = None;

            FactRow {
                contributing_factor_ids: factors
                    .each_ref()
                    .map(|v| contributing_factors.id_of(v.as_deref())),
                vehicle_type_ids: vehicles.each_ref().map(|v| vehicle_types.id_of(v.as_deref())),
                borough_id: boroughs.id_of(borough_name.as_deref()),
                record,
            }
        })
        .collect();

    DataModel {
        facts,
        contributing_factors,
        vehicle_types,
        boroughs,
    }
}
