#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for borough attribution.
//!
//! Loads borough boundary polygons from a `GeoJSON` feature collection,
//! bulk-loads their bounding envelopes into an R-tree, and answers
//! point-in-polygon lookups by testing only the envelope candidates.

use std::path::Path;

use crash_map_crash_models::Borough;
use geo::{Contains, MultiPolygon};
use geojson::GeoJson;
use rstar::{AABB, RTree, RTreeObject};

/// Errors that can occur while loading boundary polygons.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// The boundary file could not be read.
    #[error("I/O error reading boundaries: {0}")]
    Io(#[from] std::io::Error),

    /// The boundary file is not valid `GeoJSON`.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The `GeoJSON` document is valid but not a feature collection.
    #[error("Expected a GeoJSON FeatureCollection of borough boundaries")]
    NotFeatureCollection,
}

/// A boundary polygon stored in the R-tree with its borough.
struct BoundaryEntry {
    borough: Borough,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over borough boundaries.
///
/// Constructed once per run and shared by every enrichment pass.
pub struct BoroughIndex {
    boundaries: RTree<BoundaryEntry>,
}

impl BoroughIndex {
    /// Reads a `GeoJSON` boundary file and builds the index.
    ///
    /// `name_property` is the feature property holding the borough name
    /// (e.g. `"BoroName"`).
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be read or parsed.
    pub fn load(path: &Path, name_property: &str) -> Result<Self, SpatialError> {
        let contents = std::fs::read_to_string(path)?;
        let index = Self::from_geojson(&contents, name_property)?;
        log::info!(
            "Loaded {} borough boundaries from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Builds the index from a `GeoJSON` feature collection string.
    ///
    /// Features with a missing or unrecognized borough name, or with a
    /// geometry that is not a polygon, are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the string is not a `GeoJSON` feature
    /// collection.
    pub fn from_geojson(geojson_str: &str, name_property: &str) -> Result<Self, SpatialError> {
        let GeoJson::FeatureCollection(collection) = geojson_str.parse::<GeoJson>()? else {
            return Err(SpatialError::NotFeatureCollection);
        };

        let mut polygons = Vec::with_capacity(collection.features.len());

        for (i, feature) in collection.features.into_iter().enumerate() {
            let raw_name = feature
                .property(name_property)
                .and_then(|value| value.as_str())
                .map(str::to_string);

            let Some(borough) = raw_name.as_deref().and_then(Borough::coerce) else {
                log::warn!(
                    "Skipping boundary feature {i}: unrecognized {name_property} {raw_name:?}"
                );
                continue;
            };

            let Some(multi_polygon) = feature.geometry.and_then(to_multipolygon) else {
                log::warn!("Skipping boundary feature {i} ({borough}): not a polygon geometry");
                continue;
            };

            polygons.push((borough, multi_polygon));
        }

        Ok(Self::from_polygons(polygons))
    }

    /// Builds the index from already-parsed polygons.
    #[must_use]
    pub fn from_polygons(polygons: impl IntoIterator<Item = (Borough, MultiPolygon<f64>)>) -> Self {
        let entries = polygons
            .into_iter()
            .map(|(borough, polygon)| BoundaryEntry {
                borough,
                envelope: compute_envelope(&polygon),
                polygon,
            })
            .collect();

        Self {
            boundaries: RTree::bulk_load(entries),
        }
    }

    /// Look up the borough containing a point.
    ///
    /// Boroughs tile the city without overlap, so first match wins.
    #[must_use]
    pub fn lookup(&self, lng: f64, lat: f64) -> Option<Borough> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.boundaries
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| entry.polygon.contains(&point))
            .map(|entry| entry.borough)
    }

    /// Number of boundary polygons in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boundaries.size()
    }

    /// Whether the index holds no boundaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.size() == 0
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit squares side by side: Manhattan on [0,1], Brooklyn on [1,2].
    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "BoroName": "Manhattan" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "BoroName": "Brooklyn" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 0.0]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "BoroName": "Atlantis" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0], [5.0, 5.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "BoroName": "Queens" },
                "geometry": { "type": "Point", "coordinates": [3.0, 3.0] }
            }
        ]
    }"#;

    #[test]
    fn loads_polygon_and_multipolygon_features() {
        let index = BoroughIndex::from_geojson(BOUNDARIES, "BoroName").unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn looks_up_containing_borough() {
        let index = BoroughIndex::from_geojson(BOUNDARIES, "BoroName").unwrap();
        assert_eq!(index.lookup(0.5, 0.5), Some(Borough::Manhattan));
        assert_eq!(index.lookup(1.5, 0.25), Some(Borough::Brooklyn));
        assert_eq!(index.lookup(5.5, 5.5), None);
        assert_eq!(index.lookup(-10.0, 40.0), None);
    }

    #[test]
    fn rejects_non_collection() {
        let point = r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#;
        assert!(matches!(
            BoroughIndex::from_geojson(point, "BoroName"),
            Err(SpatialError::NotFeatureCollection)
        ));
    }

    #[test]
    fn reads_configured_name_property() {
        let index = BoroughIndex::from_geojson(BOUNDARIES, "boro_name").unwrap();
        assert!(index.is_empty());
    }
}
