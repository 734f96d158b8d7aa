use crate::controls::{GroupControl, LayerGroupController, ZoomTarget};
use crate::core::config::DashboardConfig;
use crate::core::geo::Point;
use crate::data::attributes::{AttributeFeed, AttributeStore};
use crate::interaction::{ClickOutcome, InteractionDispatcher};
use crate::legend::signal::StyleChangeSignal;
use crate::legend::{Legend, LegendSynchronizer};
use crate::map::engine::MapEngine;
use crate::map::events::MapEvent;
use crate::prelude::HashMap;
use crate::Result;
use instant::Instant;
use log::{debug, info};
use std::cell::{Ref, RefCell};
use std::time::Duration;

/// The state-synchronization core around one map.
///
/// Owns the engine, the attribute table, the legend, the layer-group
/// checkboxes and the pointer dispatcher. Lifecycle events feed a debounced
/// style-change signal; [`Dashboard::tick`] refreshes the legend and the
/// checkboxes when it fires.
pub struct Dashboard<M: MapEngine> {
    config: DashboardConfig,
    map: RefCell<M>,
    store: AttributeStore,
    legend: LegendSynchronizer,
    controls: LayerGroupController,
    dispatcher: InteractionDispatcher,
    signal: StyleChangeSignal,
    zoom_targets: HashMap<String, ZoomTarget>,
}

impl<M: MapEngine> Dashboard<M> {
    pub fn new(map: M, config: DashboardConfig) -> Self {
        let controls = LayerGroupController::build(&map, &config.controls.groups, &HashMap::default());
        let mut dashboard = Self {
            store: AttributeStore::new(config.attributes.key_column.clone()),
            legend: LegendSynchronizer::new(config.legend.clone()),
            dispatcher: InteractionDispatcher::from_config(&config),
            signal: StyleChangeSignal::new(Duration::from_millis(config.legend.debounce_ms)),
            map: RefCell::new(map),
            controls,
            zoom_targets: HashMap::default(),
            config,
        };
        dashboard.refresh_legend();
        dashboard
    }

    /// Attaches zoom-to-layer presets and rebuilds the control rows
    pub fn with_zoom_targets(mut self, zoom_targets: HashMap<String, ZoomTarget>) -> Self {
        self.zoom_targets = zoom_targets;
        self.rebuild_controls();
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn map(&self) -> Ref<'_, M> {
        self.map.borrow()
    }

    pub fn map_mut(&mut self) -> &mut M {
        self.map.get_mut()
    }

    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AttributeStore {
        &mut self.store
    }

    pub fn legend(&self) -> &Legend {
        self.legend.legend()
    }

    pub fn controls(&self) -> &[GroupControl] {
        self.controls.controls()
    }

    pub fn dispatcher(&self) -> &InteractionDispatcher {
        &self.dispatcher
    }

    pub fn handle_event(&mut self, event: MapEvent) {
        self.handle_event_at(event, Instant::now());
    }

    /// Routes one map event; `now` timestamps style-change notices
    pub fn handle_event_at(&mut self, event: MapEvent, now: Instant) {
        if event.signals_style_change() {
            self.signal.notify(now);
        }
        match event {
            MapEvent::Load => self.rebuild_controls(),
            MapEvent::PointerMove { point } => self.dispatcher.on_pointer_move(self.map.get_mut(), point),
            MapEvent::PointerLeave => self.dispatcher.on_pointer_leave(self.map.get_mut()),
            MapEvent::Click { .. } => debug!("Click events are handled by Dashboard::click"),
            _ => {}
        }
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Refreshes legend and checkboxes if the style-change signal fired
    pub fn tick_at(&mut self, now: Instant) -> bool {
        if !self.signal.poll(now) {
            return false;
        }
        self.refresh_legend();
        self.controls.refresh_checked(self.map.get_mut());
        true
    }

    pub fn refresh_legend(&mut self) -> &Legend {
        let style = self.map.get_mut().style();
        self.legend.refresh(style.as_ref(), &self.config.legend.groups)
    }

    pub async fn click(&self, point: Point) -> ClickOutcome {
        self.dispatcher.on_click(&self.map, &self.store, point).await
    }

    /// Toggles a group, then refreshes its checkboxes and the legend at once
    pub fn toggle_group(&mut self, label: &str, visible: bool) -> Result<()> {
        let result = self.controls.toggle(self.map.get_mut(), label, visible);
        self.controls.refresh_checked(self.map.get_mut());
        self.refresh_legend();
        self.signal.clear();
        result
    }

    /// Re-fetches the attribute table, e.g. after an upload completes
    pub async fn reload_attributes(&mut self, feed: &dyn AttributeFeed) -> Result<usize> {
        let count = self.store.refresh(feed).await?;
        info!("Attribute table reloaded with {} records", count);
        Ok(count)
    }

    pub fn close_popup(&mut self) {
        self.dispatcher.close_popup(self.map.get_mut());
    }

    pub fn zoom_to_group(&mut self, label: &str) -> bool {
        self.controls.zoom_to(self.map.get_mut(), label)
    }

    fn rebuild_controls(&mut self) {
        self.controls = LayerGroupController::build(
            self.map.get_mut(),
            &self.config.controls.groups,
            &self.zoom_targets,
        );
    }
}
