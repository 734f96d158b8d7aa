use crate::core::geo::{LatLng, LatLngBounds};
use crate::style::value_label;
use geo::Centroid;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    /// Every `[lng, lat]` position, flattened in document order
    pub fn positions(&self) -> Vec<[f64; 2]> {
        let mut out = Vec::new();
        self.collect_positions(&mut out);
        out
    }

    fn collect_positions(&self, out: &mut Vec<[f64; 2]>) {
        match self {
            Geometry::Point { coordinates } => out.push(*coordinates),
            Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
                out.extend_from_slice(coordinates)
            }
            Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
                coordinates.iter().for_each(|ring| out.extend_from_slice(ring))
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .for_each(|ring| out.extend_from_slice(ring)),
            Geometry::GeometryCollection { geometries } => geometries
                .iter()
                .for_each(|geometry| geometry.collect_positions(out)),
        }
    }

    /// True for areal geometries, which are hit-tested by containment
    pub fn is_areal(&self) -> bool {
        matches!(self, Geometry::Polygon { .. } | Geometry::MultiPolygon { .. })
    }

    /// Converts into `geo_types` for centroid and containment math
    pub fn to_geo(&self) -> geo_types::Geometry<f64> {
        use geo_types::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon};

        fn line(coords: &[[f64; 2]]) -> LineString<f64> {
            LineString::from(
                coords
                    .iter()
                    .map(|c| Coord { x: c[0], y: c[1] })
                    .collect::<Vec<_>>(),
            )
        }

        fn polygon(rings: &[Vec<[f64; 2]>]) -> Polygon<f64> {
            let mut rings = rings.iter().map(|ring| line(ring));
            let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
            Polygon::new(exterior, rings.collect())
        }

        match self {
            Geometry::Point { coordinates } => {
                geo_types::Point::new(coordinates[0], coordinates[1]).into()
            }
            Geometry::LineString { coordinates } => line(coordinates).into(),
            Geometry::Polygon { coordinates } => polygon(coordinates).into(),
            Geometry::MultiPoint { coordinates } => MultiPoint::from(
                coordinates
                    .iter()
                    .map(|c| geo_types::Point::new(c[0], c[1]))
                    .collect::<Vec<_>>(),
            )
            .into(),
            Geometry::MultiLineString { coordinates } => {
                MultiLineString::new(coordinates.iter().map(|l| line(l)).collect()).into()
            }
            Geometry::MultiPolygon { coordinates } => {
                MultiPolygon::new(coordinates.iter().map(|p| polygon(p)).collect()).into()
            }
            Geometry::GeometryCollection { geometries } => {
                geo_types::Geometry::GeometryCollection(geo_types::GeometryCollection::from(
                    geometries.iter().map(Geometry::to_geo).collect::<Vec<_>>(),
                ))
            }
        }
    }
}

/// Identifier joining map geometry to attribute records (a watershed code, case code or project id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// GeoJSON feature with geometry and an insertion-ordered property bag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Feature {
    pub fn new(geometry: Option<Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            id: None,
            geometry,
            properties,
        }
    }

    /// Reads an identifier property; `None` when the field is absent or null
    pub fn identifier(&self, field: &str) -> Option<FeatureId> {
        match self.properties.get(field)? {
            Value::Null => None,
            value => Some(FeatureId(value_label(value))),
        }
    }

    /// Bounding region over every valid coordinate pair.
    ///
    /// Out-of-range pairs are logged and skipped; `None` when nothing valid remains.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let Some(geometry) = &self.geometry else {
            warn!("Feature has no geometry; no bounds computed");
            return None;
        };

        let valid = geometry.positions().into_iter().filter_map(|position| {
            let coord = LatLng::from_position(position);
            if coord.is_valid() {
                Some(coord)
            } else {
                warn!("Invalid coordinate: [{}, {}]", position[0], position[1]);
                None
            }
        });

        LatLngBounds::from_points(valid)
    }

    /// Geometric centroid, used as the popup anchor
    pub fn centroid(&self) -> Option<LatLng> {
        let point = self.geometry.as_ref()?.to_geo().centroid()?;
        let center = LatLng::new(point.y(), point.x());
        center.is_finite().then_some(center)
    }
}

/// Root GeoJSON feature collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn from_json_str(geojson: &str) -> crate::Result<Self> {
        serde_json::from_str(geojson)
            .map_err(|e| crate::Error::ParseError(format!("Invalid GeoJSON: {}", e)))
    }
}

/// Feature as returned by a rendered-feature query, tagged with the layer it was drawn by
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    pub layer_id: String,
    pub feature: Feature,
}
