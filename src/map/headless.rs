use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::viewport::{Camera, CameraOptions, Viewport};
use crate::constants::HIT_TOLERANCE_PX;
use crate::data::feature::{FeatureCollection, RenderedFeature};
use crate::map::engine::{Cursor, MapEngine, PopupHandle, PopupSpec};
use crate::map::index::FeatureIndex;
use crate::prelude::HashMap;
use crate::style::{value_label, StyleLayer, StyleSnapshot, Visibility};
use crate::{Error, Result};
use log::debug;
use serde_json::{Map, Value};

struct Source {
    collection: FeatureCollection,
    index: FeatureIndex,
}

/// In-memory map engine.
///
/// Holds GeoJSON sources, a style, a Web Mercator viewport, layer filters,
/// open popups and the cursor. Rendered-feature queries hit visible layers
/// only; layer filters are stored but not applied to queries.
pub struct HeadlessMap {
    viewport: Viewport,
    style: Option<StyleSnapshot>,
    sources: HashMap<String, Source>,
    filters: HashMap<String, Value>,
    popups: Vec<(PopupHandle, PopupSpec)>,
    next_popup: u64,
    cursor: Cursor,
}

impl HeadlessMap {
    /// A map with no style loaded yet
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            style: None,
            sources: HashMap::default(),
            filters: HashMap::default(),
            popups: Vec::new(),
            next_popup: 0,
            cursor: Cursor::Default,
        }
    }

    pub fn with_style(mut self, style: StyleSnapshot) -> Self {
        self.set_style(style);
        self
    }

    pub fn set_style(&mut self, style: StyleSnapshot) {
        debug!("Style set with {} layers", style.layers.len());
        self.style = Some(style);
    }

    /// Appends a layer on top of the style, creating an empty style if needed
    pub fn add_layer(&mut self, layer: StyleLayer) -> Result<()> {
        let style = self.style.get_or_insert_with(StyleSnapshot::default);
        if style.layer(&layer.id).is_some() {
            return Err(Error::Layer(format!("Layer '{}' already exists", layer.id)));
        }
        style.layers.push(layer);
        Ok(())
    }

    /// Adds or replaces a GeoJSON source and indexes its features
    pub fn add_source(&mut self, id: impl Into<String>, collection: FeatureCollection) {
        let id = id.into();
        let index = FeatureIndex::build(&collection.features);
        debug!(
            "Source '{}' indexed {} of {} features",
            id,
            index.len(),
            collection.features.len()
        );
        self.sources.insert(id, Source { collection, index });
    }

    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id).map(|source| &source.collection)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn resize(&mut self, size: Point) {
        self.viewport.set_size(size);
    }

    pub fn filter(&self, layer_id: &str) -> Option<&Value> {
        self.filters.get(layer_id)
    }

    /// The loaded style, borrowed
    pub fn style_snapshot(&self) -> Option<&StyleSnapshot> {
        self.style.as_ref()
    }

    /// Whether a feature passes the layer's `["==", field, value]` filter.
    /// Layers without a filter pass everything; other expressions pass too.
    pub fn passes_filter(&self, layer_id: &str, properties: &Map<String, Value>) -> bool {
        let Some(filter) = self.filters.get(layer_id).and_then(Value::as_array) else {
            return true;
        };
        match filter.as_slice() {
            [op, Value::String(field), expected] if op == "==" => properties
                .get(field)
                .is_some_and(|value| value_label(value) == value_label(expected)),
            _ => true,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn popups(&self) -> impl Iterator<Item = &PopupSpec> {
        self.popups.iter().map(|(_, spec)| spec)
    }

    pub fn popup_count(&self) -> usize {
        self.popups.len()
    }

    /// Most recently added popup still open
    pub fn open_popup(&self) -> Option<&PopupSpec> {
        self.popups.last().map(|(_, spec)| spec)
    }

    /// Container pixel of a coordinate at the current camera
    pub fn pixel_of(&self, lat_lng: &LatLng) -> Point {
        self.viewport.lat_lng_to_pixel(lat_lng)
    }

    fn probe_at(&self, point: Point) -> Option<LatLngBounds> {
        let reach = Point::new(HIT_TOLERANCE_PX, HIT_TOLERANCE_PX);
        let corners = [
            self.viewport.pixel_to_lat_lng(&point.subtract(&reach)),
            self.viewport.pixel_to_lat_lng(&point.add(&reach)),
        ];
        LatLngBounds::from_points(corners)
    }
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl MapEngine for HeadlessMap {
    fn style(&self) -> Option<StyleSnapshot> {
        self.style.clone()
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        self.style
            .as_ref()
            .is_some_and(|style| style.layer(layer_id).is_some())
    }

    fn visibility(&self, layer_id: &str) -> Option<Visibility> {
        self.style.as_ref()?.layer(layer_id).map(StyleLayer::visibility)
    }

    fn set_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<()> {
        let layer = self
            .style
            .as_mut()
            .and_then(|style| style.layer_mut(layer_id))
            .ok_or_else(|| Error::Layer(format!("Layer '{}' does not exist", layer_id)))?;
        layer.set_visibility(visibility);
        Ok(())
    }

    fn set_filter(&mut self, layer_id: &str, filter: Value) -> Result<()> {
        if !self.has_layer(layer_id) {
            return Err(Error::Layer(format!("Layer '{}' does not exist", layer_id)));
        }
        self.filters.insert(layer_id.to_string(), filter);
        Ok(())
    }

    fn query_rendered_features(&self, point: Point, layer_ids: &[String]) -> Vec<RenderedFeature> {
        let (Some(style), Some(probe)) = (&self.style, self.probe_at(point)) else {
            return Vec::new();
        };

        let mut rendered = Vec::new();
        // Topmost layer first, like the browser engine
        for layer in style.layers.iter().rev() {
            if !layer_ids.contains(&layer.id) || !layer.visibility().is_visible() {
                continue;
            }
            let Some(source) = layer.source.as_deref().and_then(|id| self.sources.get(id)) else {
                continue;
            };
            rendered.extend(source.index.hits(&probe).into_iter().map(|position| {
                RenderedFeature {
                    layer_id: layer.id.clone(),
                    feature: source.collection.features[position].clone(),
                }
            }));
        }
        rendered
    }

    fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    fn camera_for_bounds(&self, bounds: &LatLngBounds, options: &CameraOptions) -> Option<Camera> {
        self.viewport.camera_for_bounds(bounds, options)
    }

    fn jump_to(&mut self, camera: Camera) {
        debug!(
            "Jumping to [{:.4}, {:.4}] at zoom {}",
            camera.center.lng, camera.center.lat, camera.zoom
        );
        self.viewport.jump_to(camera);
    }

    fn add_popup(&mut self, spec: PopupSpec) -> PopupHandle {
        let handle = PopupHandle(self.next_popup);
        self.next_popup += 1;
        self.popups.push((handle, spec));
        handle
    }

    fn remove_popup(&mut self, handle: PopupHandle) {
        self.popups.retain(|(open, _)| *open != handle);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::{Feature, Geometry};
    use crate::popup::PopupViewModel;
    use crate::style::LayerType;
    use serde_json::{json, Map};

    fn square_map() -> HeadlessMap {
        let mut properties = Map::new();
        properties.insert("HUC8".into(), json!("07080104"));
        let feature = Feature::new(
            Some(Geometry::Polygon {
                coordinates: vec![vec![
                    [-94.0, 41.0],
                    [-93.0, 41.0],
                    [-93.0, 42.0],
                    [-94.0, 42.0],
                    [-94.0, 41.0],
                ]],
            }),
            properties,
        );

        let mut map = HeadlessMap::default();
        map.add_source("ProjectAreas", FeatureCollection::new(vec![feature]));
        map.add_layer(StyleLayer::new("areas-fill", LayerType::Fill).with_source("ProjectAreas"))
            .unwrap();
        map.add_layer(StyleLayer::new("areas-interaction", LayerType::Fill).with_source("ProjectAreas"))
            .unwrap();
        map
    }

    #[test]
    fn test_query_hits_visible_layers_topmost_first() {
        let mut map = square_map();
        let point = map.pixel_of(&LatLng::new(41.5, -93.5));
        let layers = vec!["areas-fill".to_string(), "areas-interaction".to_string()];

        let hits = map.query_rendered_features(point, &layers);
        let ids: Vec<&str> = hits.iter().map(|hit| hit.layer_id.as_str()).collect();
        assert_eq!(ids, ["areas-interaction", "areas-fill"]);

        map.set_visibility("areas-fill", Visibility::None).unwrap();
        assert_eq!(map.query_rendered_features(point, &layers).len(), 1);

        let outside = map.pixel_of(&LatLng::new(43.0, -90.0));
        assert!(map.query_rendered_features(outside, &layers).is_empty());
    }

    #[test]
    fn test_missing_layers_are_errors() {
        let mut map = square_map();
        assert!(matches!(
            map.set_visibility("nope", Visibility::None),
            Err(Error::Layer(_))
        ));
        assert!(map.set_filter("nope", json!(["==", "HUC8", ""])).is_err());
        assert!(map.add_layer(StyleLayer::new("areas-fill", LayerType::Line)).is_err());
        assert_eq!(map.visibility("nope"), None);
        assert_eq!(map.visibility("areas-fill"), Some(Visibility::Visible));
    }

    #[test]
    fn test_popups_are_tracked_by_handle() {
        let mut map = HeadlessMap::default();
        let spec = PopupSpec {
            position: LatLng::new(42.0, -93.5),
            anchor: "bottom".into(),
            offset: Point::new(0.0, -15.0),
            content: PopupViewModel::default(),
        };
        let first = map.add_popup(spec.clone());
        let second = map.add_popup(spec);
        assert_ne!(first, second);
        assert_eq!(map.popup_count(), 2);

        map.remove_popup(first);
        map.remove_popup(first);
        assert_eq!(map.popup_count(), 1);
    }

    #[test]
    fn test_no_style_means_no_features() {
        let map = HeadlessMap::default();
        assert!(map.style().is_none());
        assert!(!map.has_layer("areas-interaction"));
        assert!(map
            .query_rendered_features(Point::new(600.0, 400.0), &["areas-interaction".to_string()])
            .is_empty());
    }

    #[test]
    fn test_equality_filter() {
        let mut map = square_map();
        let mut properties = Map::new();
        properties.insert("HUC8".into(), json!("07080104"));
        assert!(map.passes_filter("areas-fill", &properties));

        map.set_filter("areas-fill", json!(["==", "HUC8", ""])).unwrap();
        assert!(!map.passes_filter("areas-fill", &properties));

        map.set_filter("areas-fill", json!(["==", "HUC8", "07080104"])).unwrap();
        assert!(map.passes_filter("areas-fill", &properties));
    }
}
