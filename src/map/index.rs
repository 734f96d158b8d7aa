//! R-tree over feature bounds for rendered-feature queries.

use crate::core::geo::LatLngBounds;
use crate::data::feature::Feature;
use geo::Intersects;
use rstar::{RTree, RTreeObject, AABB};

/// A feature's position in its source plus its envelope and geometry
#[derive(Debug, Clone)]
pub struct IndexedFeature {
    pub position: usize,
    geometry: geo_types::Geometry<f64>,
    areal: bool,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedFeature {
    /// Exact test against a lng/lat probe.
    ///
    /// Polygons must contain the point itself; lines and points only need to
    /// touch the tolerance box around it.
    fn hit(&self, point: &geo_types::Point<f64>, tolerance: &geo_types::Polygon<f64>) -> bool {
        if self.areal {
            self.geometry.intersects(point)
        } else {
            self.geometry.intersects(tolerance)
        }
    }
}

/// Spatial index of one source's features
pub struct FeatureIndex {
    rtree: RTree<IndexedFeature>,
}

impl Default for FeatureIndex {
    fn default() -> Self {
        Self {
            rtree: RTree::new(),
        }
    }
}

impl FeatureIndex {
    /// Indexes every feature with valid bounds; the rest can never be hit
    pub fn build(features: &[Feature]) -> Self {
        let items = features
            .iter()
            .enumerate()
            .filter_map(|(position, feature)| {
                let geometry = feature.geometry.as_ref()?;
                let bounds = feature.bounds()?;
                Some(IndexedFeature {
                    position,
                    geometry: geometry.to_geo(),
                    areal: geometry.is_areal(),
                    envelope: envelope_of(&bounds),
                })
            })
            .collect();
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// Source positions of features hit by `probe`, ascending.
    /// `probe` is the tolerance box around the query point.
    pub fn hits(&self, probe: &LatLngBounds) -> Vec<usize> {
        let center = probe.center();
        let point = geo_types::Point::new(center.lng, center.lat);
        let tolerance = geo_types::Rect::new(
            geo_types::coord! { x: probe.west(), y: probe.south() },
            geo_types::coord! { x: probe.east(), y: probe.north() },
        )
        .to_polygon();

        let mut positions: Vec<usize> = self
            .rtree
            .locate_in_envelope_intersecting(&envelope_of(probe))
            .filter(|item| item.hit(&point, &tolerance))
            .map(|item| item.position)
            .collect();
        positions.sort_unstable();
        positions
    }
}

fn envelope_of(bounds: &LatLngBounds) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [bounds.west(), bounds.south()],
        [bounds.east(), bounds.north()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::Geometry;
    use serde_json::Map;

    fn polygon(west: f64, south: f64, east: f64, north: f64) -> Feature {
        Feature::new(
            Some(Geometry::Polygon {
                coordinates: vec![vec![
                    [west, south],
                    [east, south],
                    [east, north],
                    [west, north],
                    [west, south],
                ]],
            }),
            Map::new(),
        )
    }

    fn probe(lng: f64, lat: f64, half: f64) -> LatLngBounds {
        LatLngBounds::from_coords(lat - half, lng - half, lat + half, lng + half)
    }

    #[test]
    fn test_polygon_hits_need_containment() {
        // An L-shaped footprint: the bbox covers the notch but the polygon does not
        let l_shape = Feature::new(
            Some(Geometry::Polygon {
                coordinates: vec![vec![
                    [-94.0, 41.0],
                    [-92.0, 41.0],
                    [-92.0, 42.0],
                    [-93.0, 42.0],
                    [-93.0, 43.0],
                    [-94.0, 43.0],
                    [-94.0, 41.0],
                ]],
            }),
            Map::new(),
        );
        let index = FeatureIndex::build(&[l_shape, polygon(-91.0, 41.0, -90.0, 42.0)]);
        assert_eq!(index.len(), 2);

        assert_eq!(index.hits(&probe(-93.5, 42.5, 0.001)), vec![0]);
        assert!(index.hits(&probe(-92.5, 42.5, 0.001)).is_empty());
        assert_eq!(index.hits(&probe(-90.5, 41.5, 0.001)), vec![1]);
    }

    #[test]
    fn test_lines_hit_within_tolerance() {
        let line = Feature::new(
            Some(Geometry::LineString {
                coordinates: vec![[-94.0, 42.0], [-92.0, 42.0]],
            }),
            Map::new(),
        );
        let index = FeatureIndex::build(&[line]);
        assert_eq!(index.hits(&probe(-93.0, 42.005, 0.01)), vec![0]);
        assert!(index.hits(&probe(-93.0, 42.5, 0.01)).is_empty());
    }

    #[test]
    fn test_features_without_bounds_are_skipped() {
        let index = FeatureIndex::build(&[Feature::default(), polygon(-94.0, 41.0, -93.0, 42.0)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.hits(&probe(-93.5, 41.5, 0.001)), vec![1]);
    }
}
