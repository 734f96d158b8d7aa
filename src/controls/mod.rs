//! Layer-group checkboxes.
//!
//! A group bundles layers that are shown and hidden together. Its checkbox
//! is checked iff no member layer is hidden; a partly hidden group reads as
//! unchecked.

use crate::core::geo::LatLng;
use crate::core::viewport::Camera;
use crate::map::engine::MapEngine;
use crate::prelude::HashMap;
use crate::style::Visibility;
use crate::{Error, Result};
use log::{debug, error, warn};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerGroup {
    pub label: String,
    pub layer_ids: Vec<String>,
}

/// Ordered group definitions.
///
/// Serialized as a JSON object of label to layer ids. Older documents map a
/// label to an object (`{"a": "layer-1"}`) or a bare id; both are read as
/// lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerGroups(Vec<LayerGroup>);

impl LayerGroups {
    pub fn new(groups: Vec<LayerGroup>) -> Self {
        Self(groups)
    }

    pub fn from_pairs<L, S, I>(pairs: I) -> Self
    where
        L: Into<String>,
        S: Into<String>,
        I: IntoIterator<Item = (L, Vec<S>)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(label, ids)| LayerGroup {
                    label: label.into(),
                    layer_ids: ids.into_iter().map(Into::into).collect(),
                })
                .collect(),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayerGroup> {
        self.0.iter()
    }

    pub fn get(&self, label: &str) -> Option<&LayerGroup> {
        self.0.iter().find(|group| group.label == label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a LayerGroups {
    type Item = &'a LayerGroup;
    type IntoIter = std::slice::Iter<'a, LayerGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for LayerGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for group in &self.0 {
            map.serialize_entry(&group.label, &group.layer_ids)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LayerGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(label, members)| {
                let layer_ids = normalize_members(&label, members).map_err(D::Error::custom)?;
                Ok(LayerGroup { label, layer_ids })
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(LayerGroups)
    }
}

fn normalize_members(label: &str, members: Value) -> std::result::Result<Vec<String>, String> {
    let values = match members {
        Value::Array(values) => values,
        Value::Object(legacy) => legacy.into_iter().map(|(_, id)| id).collect(),
        Value::String(id) => vec![Value::String(id)],
        other => return Err(format!("group '{}' has invalid members: {}", label, other)),
    };
    values
        .into_iter()
        .map(|value| match value {
            Value::String(id) => Ok(id),
            other => Err(format!("group '{}' has a non-string layer id: {}", label, other)),
        })
        .collect()
}

/// Camera preset for a group's zoom-to-layer button
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTarget {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Deserialize)]
struct CentroidEntry {
    #[serde(rename = "Centroid")]
    centroid: [f64; 2],
    #[serde(rename = "Zoom")]
    zoom: f64,
}

impl ZoomTarget {
    /// Reads `{"Group": {"Centroid": [lng, lat], "Zoom": z}}`.
    /// Entries with an out-of-range centroid are dropped with a warning.
    pub fn table_from_json_str(json: &str) -> Result<HashMap<String, ZoomTarget>> {
        let entries: Map<String, Value> = serde_json::from_str(json)?;
        let mut table = HashMap::default();
        for (group, entry) in entries {
            let entry: CentroidEntry = serde_json::from_value(entry)
                .map_err(|e| Error::ParseError(format!("Centroid entry '{}': {}", group, e)))?;
            let center = LatLng::from_position(entry.centroid);
            if !center.is_valid() || !entry.zoom.is_finite() {
                warn!("Ignoring invalid zoom target for {}", group);
                continue;
            }
            table.insert(
                group,
                ZoomTarget {
                    center,
                    zoom: entry.zoom,
                },
            );
        }
        Ok(table)
    }

    pub fn camera(&self) -> Camera {
        Camera::new(self.center, self.zoom)
    }
}

/// Checkbox row of one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupControl {
    pub label: String,
    pub layer_ids: Vec<String>,
    pub checked: bool,
    /// Empty groups render a disabled checkbox
    pub inert: bool,
    pub zoom_to: Option<ZoomTarget>,
}

#[derive(Debug, Clone, Default)]
pub struct LayerGroupController {
    controls: Vec<GroupControl>,
}

impl LayerGroupController {
    /// One control per group, checked from the map's current visibility
    pub fn build<M: MapEngine + ?Sized>(
        map: &M,
        groups: &LayerGroups,
        zoom_targets: &HashMap<String, ZoomTarget>,
    ) -> Self {
        let controls = groups
            .iter()
            .map(|group| GroupControl {
                label: group.label.clone(),
                layer_ids: group.layer_ids.clone(),
                checked: all_visible(map, &group.layer_ids),
                inert: group.layer_ids.is_empty(),
                zoom_to: zoom_targets.get(&group.label).copied(),
            })
            .collect();
        Self { controls }
    }

    pub fn controls(&self) -> &[GroupControl] {
        &self.controls
    }

    pub fn control(&self, label: &str) -> Option<&GroupControl> {
        self.controls.iter().find(|control| control.label == label)
    }

    /// Shows or hides every layer of the group and updates its checkbox
    pub fn toggle<M: MapEngine + ?Sized>(&mut self, map: &mut M, label: &str, visible: bool) -> Result<()> {
        let control = self
            .controls
            .iter_mut()
            .find(|control| control.label == label)
            .ok_or_else(|| Error::Layer(format!("No layer group named '{}'", label)))?;
        if control.inert {
            debug!("Group {} has no layers; toggle ignored", label);
            return Ok(());
        }

        let result = toggle_layers(map, &control.layer_ids, visible);
        control.checked = all_visible(map, &control.layer_ids);
        result.map(|_| ())
    }

    /// Re-reads every checkbox from the map
    pub fn refresh_checked<M: MapEngine + ?Sized>(&mut self, map: &M) {
        for control in &mut self.controls {
            control.checked = all_visible(map, &control.layer_ids);
        }
    }

    /// Jumps to the group's zoom target; false when it has none
    pub fn zoom_to<M: MapEngine + ?Sized>(&self, map: &mut M, label: &str) -> bool {
        match self.control(label).and_then(|control| control.zoom_to) {
            Some(target) => {
                map.jump_to(target.camera());
                true
            }
            None => {
                warn!("No zoom target for group {}", label);
                false
            }
        }
    }
}

/// True when no existing member is hidden; missing layers do not count
fn all_visible<M: MapEngine + ?Sized>(map: &M, layer_ids: &[String]) -> bool {
    layer_ids
        .iter()
        .all(|id| map.visibility(id) != Some(Visibility::None))
}

/// Sets every existing layer in `layer_ids` to visible or hidden.
///
/// Ids the map does not know are skipped. If the map rejects a change, the
/// layers already changed by this call are restored and the error returned.
/// Returns how many layers were set.
pub fn toggle_layers<M: MapEngine + ?Sized>(
    map: &mut M,
    layer_ids: &[String],
    visible: bool,
) -> Result<usize> {
    let target = Visibility::from_flag(visible);
    let mut applied: Vec<(&str, Visibility)> = Vec::new();

    for id in layer_ids {
        let Some(previous) = map.visibility(id) else {
            debug!("Layer {} not on the map; skipped", id);
            continue;
        };
        if let Err(e) = map.set_visibility(id, target) {
            for (done, previous) in applied.iter().rev() {
                if let Err(restore) = map.set_visibility(done, *previous) {
                    error!("Failed to restore visibility of {}: {}", done, restore);
                }
            }
            return Err(e);
        }
        applied.push((id, previous));
    }
    Ok(applied.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::{LatLngBounds, Point};
    use crate::core::viewport::CameraOptions;
    use crate::data::feature::RenderedFeature;
    use crate::map::engine::{Cursor, PopupHandle, PopupSpec};
    use crate::map::headless::HeadlessMap;
    use crate::style::{LayerType, StyleLayer, StyleSnapshot};

    fn map_with(layers: &[(&str, Visibility)]) -> HeadlessMap {
        let style = StyleSnapshot::new(
            layers
                .iter()
                .map(|(id, visibility)| StyleLayer::new(*id, LayerType::Fill).with_visibility(*visibility))
                .collect(),
        );
        HeadlessMap::default().with_style(style)
    }

    /// Rejects visibility changes on one layer
    struct StubbornMap {
        inner: HeadlessMap,
        stuck: &'static str,
    }

    impl MapEngine for StubbornMap {
        fn style(&self) -> Option<StyleSnapshot> {
            self.inner.style()
        }
        fn has_layer(&self, id: &str) -> bool {
            self.inner.has_layer(id)
        }
        fn visibility(&self, id: &str) -> Option<Visibility> {
            self.inner.visibility(id)
        }
        fn set_visibility(&mut self, id: &str, visibility: Visibility) -> Result<()> {
            if id == self.stuck {
                return Err(Error::Layer(format!("{} is locked", id)));
            }
            self.inner.set_visibility(id, visibility)
        }
        fn set_filter(&mut self, id: &str, filter: Value) -> Result<()> {
            self.inner.set_filter(id, filter)
        }
        fn query_rendered_features(&self, point: Point, ids: &[String]) -> Vec<RenderedFeature> {
            self.inner.query_rendered_features(point, ids)
        }
        fn zoom(&self) -> f64 {
            self.inner.zoom()
        }
        fn camera_for_bounds(&self, bounds: &LatLngBounds, options: &CameraOptions) -> Option<Camera> {
            self.inner.camera_for_bounds(bounds, options)
        }
        fn jump_to(&mut self, camera: Camera) {
            self.inner.jump_to(camera)
        }
        fn add_popup(&mut self, spec: PopupSpec) -> PopupHandle {
            self.inner.add_popup(spec)
        }
        fn remove_popup(&mut self, handle: PopupHandle) {
            self.inner.remove_popup(handle)
        }
        fn set_cursor(&mut self, cursor: Cursor) {
            self.inner.set_cursor(cursor)
        }
    }

    #[test]
    fn test_legacy_shapes_normalize_in_order() {
        let groups = LayerGroups::from_json_str(
            r#"{"Draft MIP": ["draft-mip"], "Outlines": {"a": "submittal-info", "b": "submittal-info_outline"},
                "TO Areas": "work-areas", "Empty": []}"#,
        )
        .unwrap();
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["Draft MIP", "Outlines", "TO Areas", "Empty"]);
        assert_eq!(
            groups.get("Outlines").unwrap().layer_ids,
            ["submittal-info", "submittal-info_outline"]
        );
        assert_eq!(groups.get("TO Areas").unwrap().layer_ids, ["work-areas"]);

        assert!(LayerGroups::from_json_str(r#"{"Bad": [1, 2]}"#).is_err());
        assert!(LayerGroups::from_json_str(r#"{"Bad": 7}"#).is_err());
    }

    #[test]
    fn test_checked_requires_every_member_visible() {
        let map = map_with(&[("a", Visibility::Visible), ("b", Visibility::None)]);
        let groups = LayerGroups::from_pairs([
            ("Both", vec!["a", "b"]),
            ("Only a", vec!["a"]),
            ("Ghost", vec!["a", "missing"]),
            ("Empty", vec![]),
        ]);
        let controller = LayerGroupController::build(&map, &groups, &HashMap::default());

        assert!(!controller.control("Both").unwrap().checked);
        assert!(controller.control("Only a").unwrap().checked);
        assert!(controller.control("Ghost").unwrap().checked);
        assert!(controller.control("Empty").unwrap().inert);
    }

    #[test]
    fn test_toggle_skips_missing_and_updates_checkbox() {
        let mut map = map_with(&[("a", Visibility::Visible), ("b", Visibility::None)]);
        let groups = LayerGroups::from_pairs([("Both", vec!["a", "missing", "b"])]);
        let mut controller = LayerGroupController::build(&map, &groups, &HashMap::default());

        controller.toggle(&mut map, "Both", true).unwrap();
        assert!(controller.control("Both").unwrap().checked);
        assert_eq!(map.visibility("b"), Some(Visibility::Visible));

        controller.toggle(&mut map, "Both", false).unwrap();
        assert!(!controller.control("Both").unwrap().checked);
        assert_eq!(map.visibility("a"), Some(Visibility::None));

        assert!(controller.toggle(&mut map, "Nope", true).is_err());
    }

    #[test]
    fn test_rejected_change_rolls_back() {
        let mut map = StubbornMap {
            inner: map_with(&[
                ("a", Visibility::Visible),
                ("b", Visibility::Visible),
                ("c", Visibility::Visible),
            ]),
            stuck: "c",
        };
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        assert!(toggle_layers(&mut map, &ids, false).is_err());
        assert_eq!(map.visibility("a"), Some(Visibility::Visible));
        assert_eq!(map.visibility("b"), Some(Visibility::Visible));
    }

    #[test]
    fn test_zoom_targets() {
        let table = ZoomTarget::table_from_json_str(
            r#"{"TO Areas": {"Centroid": [-93.1, 41.9], "Zoom": 8.5},
                "Broken": {"Centroid": [500, 41.9], "Zoom": 8}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);

        let mut map = map_with(&[("work-areas", Visibility::Visible)]);
        let groups = LayerGroups::from_pairs([("TO Areas", vec!["work-areas"]), ("Other", vec![])]);
        let controller = LayerGroupController::build(&map, &groups, &table);

        assert!(controller.zoom_to(&mut map, "TO Areas"));
        assert_eq!(map.zoom(), 8.5);
        assert!((map.viewport().center.lng + 93.1).abs() < 1e-9);
        assert!(!controller.zoom_to(&mut map, "Other"));
    }
}
