use anyhow::Context;
use futures::executor::block_on;
use log::{info, warn};
use statusmap::{
    data::attributes::{AttributeFormat, HttpAttributeFeed, StaticAttributeFeed},
    data::status::{fetch_last_updated, last_updated_text},
    prelude::HashMap,
    ui::{attribute_table, layer_controls, legend_panel, map_canvas, popup_table, ControlAction, PanelStyle},
    AttributeFeed, Dashboard, DashboardConfig, FeatureCollection, HeadlessMap, HighlightFilter, LatLng, MapEngine, MapEvent, Point,
    StyleSnapshot, Viewport, ZoomTarget,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Desktop status dashboard over a directory of demo data
fn main() -> anyhow::Result<()> {
    statusmap::init_logging();

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos"));
    let runtime = tokio::runtime::Runtime::new()?;
    let (dashboard, feed, status_text) = runtime.block_on(load_dashboard(&data_dir))?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_title("Production Status"),
        ..Default::default()
    };

    eframe::run_native(
        "statusmap-app",
        options,
        Box::new(move |_cc| Box::new(StatusApp::new(runtime, dashboard, feed, status_text))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start the viewer: {}", e))
}

/// Reads config, style, sources, zoom targets and attributes from `dir`
async fn load_dashboard(dir: &Path) -> anyhow::Result<(Dashboard<HeadlessMap>, Box<dyn AttributeFeed>, String)> {
    let config = DashboardConfig::load(dir.join("config.json")).context("loading config.json")?;
    let style_json = std::fs::read_to_string(dir.join("style.json")).context("reading style.json")?;
    let style = StyleSnapshot::from_json_str(&style_json)?;

    let viewport = Viewport::new(LatLng::new(42.0, -93.4), 7.0, Point::new(960.0, 720.0));
    let mut map = HeadlessMap::new(viewport);
    let mut source_ids: Vec<&str> = style.layers.iter().filter_map(|layer| layer.source.as_deref()).collect();
    source_ids.sort_unstable();
    source_ids.dedup();
    for id in source_ids {
        let path = dir.join(format!("{}.geojson", id));
        match std::fs::read_to_string(&path) {
            Ok(geojson) => map.add_source(id, FeatureCollection::from_json_str(&geojson)?),
            Err(e) => warn!("Source {} not loaded from {}: {}", id, path.display(), e),
        }
    }
    map.set_style(style);
    let cleared = HighlightFilter::cleared().to_expression(&config.interaction.highlight_field);
    if let Err(e) = map.set_filter(&config.interaction.highlight_layer, cleared) {
        warn!("Highlight layer unavailable: {}", e);
    }

    let zoom_targets = match &config.controls.zoom_targets_path {
        Some(name) => {
            let json = std::fs::read_to_string(dir.join(name)).with_context(|| format!("reading {}", name))?;
            ZoomTarget::table_from_json_str(&json)?
        }
        None => HashMap::default(),
    };

    let feed: Box<dyn AttributeFeed> = match &config.attributes.url {
        Some(url) => Box::new(HttpAttributeFeed::new(url.clone(), config.attributes.format)),
        None => {
            let body = std::fs::read_to_string(dir.join("attributes.csv")).context("reading attributes.csv")?;
            Box::new(StaticAttributeFeed::new(body, AttributeFormat::Csv))
        }
    };

    let status_text = match &config.attributes.last_updated_url {
        Some(url) => last_updated_text(&fetch_last_updated(&reqwest::Client::new(), url).await),
        None => last_updated_text(&Ok(None)),
    };

    let mut dashboard = Dashboard::new(map, config).with_zoom_targets(zoom_targets);
    if let Err(e) = dashboard.reload_attributes(feed.as_ref()).await {
        warn!("Attribute table unavailable ({}): {}", feed.describe(), e);
    }
    info!("Dashboard ready with {} attribute records", dashboard.store().len());
    Ok((dashboard, feed, status_text))
}

struct StatusApp {
    runtime: tokio::runtime::Runtime,
    dashboard: Dashboard<HeadlessMap>,
    feed: Box<dyn AttributeFeed>,
    status_text: String,
    reload_text: Option<String>,
    style: PanelStyle,
    loaded: bool,
    pointer_inside: bool,
    show_table: bool,
}

impl StatusApp {
    fn new(
        runtime: tokio::runtime::Runtime,
        dashboard: Dashboard<HeadlessMap>,
        feed: Box<dyn AttributeFeed>,
        status_text: String,
    ) -> Self {
        Self {
            runtime,
            dashboard,
            feed,
            status_text,
            reload_text: None,
            style: PanelStyle::default(),
            loaded: false,
            pointer_inside: false,
            show_table: false,
        }
    }

    /// Re-runs the attribute feed, e.g. after an upload; a failure keeps the old table
    fn reload_attributes(&mut self) {
        let result = self
            .runtime
            .block_on(self.dashboard.reload_attributes(self.feed.as_ref()));
        self.reload_text = Some(match result {
            Ok(count) => format!("Reloaded {} attribute records", count),
            Err(e) => {
                warn!("Attribute reload from {} failed: {}", self.feed.describe(), e);
                format!("Attribute reload failed: {}", e)
            }
        });
    }

    fn apply(&mut self, action: ControlAction) {
        match action {
            ControlAction::Toggle { label, visible } => {
                if let Err(e) = self.dashboard.toggle_group(&label, visible) {
                    warn!("Toggling {} failed: {}", label, e);
                }
            }
            ControlAction::ZoomTo { label } => {
                self.dashboard.zoom_to_group(&label);
            }
        }
    }
}

impl eframe::App for StatusApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.loaded {
            self.dashboard.handle_event(MapEvent::Load);
            self.loaded = true;
        }
        self.dashboard.tick();

        let mut reload = false;
        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_text.as_str());
                if let Some(text) = &self.reload_text {
                    ui.separator();
                    ui.label(text.as_str());
                }
                ui.separator();
                ui.checkbox(&mut self.show_table, "Attribute table");
                reload = ui.button("Reload attributes").clicked();
            });
            if self.show_table {
                attribute_table(ui, self.dashboard.store(), &self.style);
            }
        });

        if reload {
            self.reload_attributes();
        }

        let mut action = None;
        egui::SidePanel::right("legend_panel").resizable(true).show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Layers");
                action = layer_controls(ui, self.dashboard.controls());
                ui.separator();
                ui.heading("Legend");
                legend_panel(ui, self.dashboard.legend(), &self.style);
            });
        });
        if let Some(action) = action {
            self.apply(action);
        }

        let response = egui::CentralPanel::default()
            .show(ctx, |ui| map_canvas(ui, &self.dashboard.map(), &self.style))
            .inner;

        if self.dashboard.map().viewport().size != response.size {
            self.dashboard.map_mut().resize(response.size);
            self.dashboard.handle_event(MapEvent::Resize { size: response.size });
        }
        if let Some(point) = response.hovered {
            self.pointer_inside = true;
            self.dashboard.handle_event(MapEvent::PointerMove { point });
        } else if response.outside && self.pointer_inside {
            self.pointer_inside = false;
            self.dashboard.handle_event(MapEvent::PointerLeave);
        }
        if let Some(point) = response.clicked {
            let outcome = block_on(self.dashboard.click(point));
            info!("Click at ({:.0}, {:.0}): {:?}", point.x, point.y, outcome);
            self.dashboard.handle_event(MapEvent::Idle);
        }

        let popup = self.dashboard.map().open_popup().map(|spec| spec.content.clone());
        if let Some(popup) = popup {
            let mut closed = false;
            egui::Window::new("feature_popup")
                .title_bar(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_TOP, [0.0, 40.0])
                .show(ctx, |ui| closed = popup_table(ui, &popup, &self.style));
            if closed {
                self.dashboard.close_popup();
            }
        }

        ctx.request_repaint_after(Duration::from_millis(self.dashboard.config().legend.debounce_ms));
    }
}
