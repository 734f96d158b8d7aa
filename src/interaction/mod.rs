//! Pointer event routing.
//!
//! Clicks open the single feature popup and frame the camera on the
//! feature. Hovering the primary layer highlights the feature under the
//! pointer. Everything runs on one UI thread; the popup slot and the
//! highlight are last-writer-wins.

use crate::camera::CameraFitCalculator;
use crate::core::config::{CameraConfig, DashboardConfig, InteractionConfig, PopupConfig};
use crate::core::geo::Point;
use crate::data::attributes::AttributeLookup;
use crate::data::feature::{FeatureId, RenderedFeature};
use crate::map::engine::{MapEngine, PopupHandle, PopupSpec};
use crate::popup::{AddOns, PopupContentBuilder, PopupSession};
use crate::style::value_label;
use log::{debug, error, warn};
use serde_json::{json, Value};
use std::cell::RefCell;

pub use crate::map::engine::Cursor;

/// The feature currently emphasized by the highlight layer, if any
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightFilter(pub Option<FeatureId>);

impl HighlightFilter {
    pub fn cleared() -> Self {
        Self(None)
    }

    pub fn of(id: FeatureId) -> Self {
        Self(Some(id))
    }

    pub fn feature_id(&self) -> Option<&FeatureId> {
        self.0.as_ref()
    }

    pub fn is_cleared(&self) -> bool {
        self.0.is_none()
    }

    /// Engine filter expression. The engine needs a concrete comparison
    /// value, so the cleared state compares against `""` there and only there.
    pub fn to_expression(&self, field: &str) -> Value {
        let id = self.0.as_ref().map(FeatureId::as_str).unwrap_or("");
        json!(["==", field, id])
    }
}

/// What a click ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing interactive under the pointer; any popup was closed
    NoFeature,
    /// Only secondary layers were hit; any popup was closed
    MissedPrimary,
    /// A newer click started while this one awaited its attributes
    Superseded,
    Opened(PopupHandle),
}

pub struct InteractionDispatcher {
    config: InteractionConfig,
    builder: PopupContentBuilder,
    camera: CameraFitCalculator,
    session: RefCell<PopupSession>,
    highlight: RefCell<HighlightFilter>,
}

impl InteractionDispatcher {
    pub fn new(interaction: InteractionConfig, popup: PopupConfig, camera: CameraConfig) -> Self {
        Self {
            config: interaction,
            builder: PopupContentBuilder::new(popup),
            camera: CameraFitCalculator::new(camera),
            session: RefCell::new(PopupSession::new()),
            highlight: RefCell::new(HighlightFilter::cleared()),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            config.interaction.clone(),
            config.popup.clone(),
            config.camera.clone(),
        )
    }

    pub fn highlight(&self) -> HighlightFilter {
        self.highlight.borrow().clone()
    }

    pub fn popup_open(&self) -> bool {
        self.session.borrow().is_open()
    }

    /// Handles a click at a container pixel.
    ///
    /// The map is borrowed only between awaits, so a second click may run
    /// while this one waits on `lookup`; whichever click started last owns
    /// the popup.
    pub async fn on_click<M, L>(&self, map: &RefCell<M>, lookup: &L, point: Point) -> ClickOutcome
    where
        M: MapEngine,
        L: AttributeLookup + ?Sized,
    {
        let ticket = self.session.borrow_mut().begin_click();

        let mut layers = vec![self.config.primary_layer.clone()];
        layers.extend(self.config.secondary_layers.iter().cloned());
        let features = map.borrow().query_rendered_features(point, &layers);
        if features.is_empty() {
            debug!("No features found");
            self.close_popup(&mut *map.borrow_mut());
            return ClickOutcome::NoFeature;
        }

        let add_ons = self.collect_add_ons(&features);
        let Some(primary) = features
            .into_iter()
            .find(|hit| hit.layer_id == self.config.primary_layer)
        else {
            debug!("Clicked feature is not part of {}", self.config.primary_layer);
            self.close_popup(&mut *map.borrow_mut());
            return ClickOutcome::MissedPrimary;
        };
        let feature = primary.feature;

        {
            let mut map = map.borrow_mut();
            if let Some(id) = feature.identifier(&self.config.highlight_field) {
                self.set_highlight(&mut *map, HighlightFilter::of(id));
            }
            self.session.borrow_mut().close(&mut *map);
        }

        let content = self.builder.build(&feature, &add_ons, lookup).await;
        if !self.session.borrow().is_current(ticket) {
            debug!("Click superseded while its popup was being built");
            return ClickOutcome::Superseded;
        }

        let Some(anchor) = feature.centroid() else {
            error!("Clicked feature has no centroid; popup not opened");
            return ClickOutcome::NoFeature;
        };

        let mut map = map.borrow_mut();
        let bounds = content.bounds.clone();
        let spec = PopupSpec {
            position: anchor,
            anchor: self.config.popup_anchor.clone(),
            offset: Point::new(self.config.popup_offset[0], self.config.popup_offset[1]),
            content,
        };
        let handle = self.session.borrow_mut().open(&mut *map, spec);

        let current_zoom = map.zoom();
        if let Some(framing) = self.camera.compute_framing(bounds.as_ref(), current_zoom, &*map) {
            map.jump_to(framing.camera());
        }
        ClickOutcome::Opened(handle)
    }

    /// Highlights the primary feature under the pointer, or clears like a leave
    pub fn on_pointer_move<M: MapEngine + ?Sized>(&self, map: &mut M, point: Point) {
        let hits = map.query_rendered_features(point, std::slice::from_ref(&self.config.primary_layer));
        let Some(hit) = hits.first() else {
            self.on_pointer_leave(map);
            return;
        };

        map.set_cursor(Cursor::Pointer);
        if let Some(id) = hit.feature.identifier(&self.config.highlight_field) {
            self.set_highlight(map, HighlightFilter::of(id));
        }
    }

    pub fn on_pointer_leave<M: MapEngine + ?Sized>(&self, map: &mut M) {
        self.set_highlight(map, HighlightFilter::cleared());
        map.set_cursor(Cursor::Default);
    }

    pub fn close_popup<M: MapEngine + ?Sized>(&self, map: &mut M) {
        self.session.borrow_mut().close(map);
    }

    /// A hit carrying the marker property contributes its add-on field
    fn collect_add_ons(&self, features: &[RenderedFeature]) -> AddOns {
        let mut add_ons = AddOns::new();
        for hit in features {
            let properties = &hit.feature.properties;
            if !properties.contains_key(&self.config.add_on_marker) {
                continue;
            }
            match properties.get(&self.config.add_on_field) {
                Some(value) => add_ons.insert(self.config.add_on_field.clone(), value_label(value)),
                None => warn!(
                    "Feature on {} has {} but no {}",
                    hit.layer_id, self.config.add_on_marker, self.config.add_on_field
                ),
            }
        }
        add_ons
    }

    fn set_highlight<M: MapEngine + ?Sized>(&self, map: &mut M, filter: HighlightFilter) {
        if *self.highlight.borrow() == filter {
            return;
        }
        let expression = filter.to_expression(&self.config.highlight_field);
        if let Err(e) = map.set_filter(&self.config.highlight_layer, expression) {
            warn!("Failed to update highlight filter: {}", e);
        }
        *self.highlight.borrow_mut() = filter;
    }
}
