#![allow(dead_code)]

use statusmap::prelude::*;
use std::path::PathBuf;

pub fn demo_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}

pub fn read_demo(name: &str) -> String {
    std::fs::read_to_string(demo_dir().join(name)).unwrap_or_else(|e| panic!("{}: {}", name, e))
}

/// The demo map centered on Iowa, sources indexed, style applied
pub fn demo_map() -> HeadlessMap {
    let viewport = Viewport::new(LatLng::new(42.0, -93.4), 7.0, Point::new(960.0, 720.0));
    let mut map = HeadlessMap::new(viewport);
    for source in ["ProjectAreas", "ModelOutlines", "WorkAreas"] {
        let geojson = read_demo(&format!("{}.geojson", source));
        map.add_source(source, FeatureCollection::from_json_str(&geojson).unwrap());
    }
    map.set_style(StyleSnapshot::from_json_str(&read_demo("style.json")).unwrap());
    map
}

pub fn demo_config() -> DashboardConfig {
    DashboardConfig::from_json_str(&read_demo("config.json")).unwrap()
}

/// Demo dashboard with the attribute table and zoom targets loaded
pub fn demo_dashboard() -> Dashboard<HeadlessMap> {
    let targets = ZoomTarget::table_from_json_str(&read_demo("Centroids.json")).unwrap();
    let mut dashboard = Dashboard::new(demo_map(), demo_config()).with_zoom_targets(targets);
    dashboard
        .store_mut()
        .load(&read_demo("attributes.csv"), AttributeFormat::Csv)
        .unwrap();
    dashboard
}

/// Container pixel of `[lng, lat]` at the dashboard's current camera
pub fn pixel(dashboard: &Dashboard<HeadlessMap>, lng: f64, lat: f64) -> Point {
    dashboard.map().pixel_of(&LatLng::new(lat, lng))
}

/// Records `warn!` and `error!` output per test thread
pub struct LogCapture {
    thread: std::thread::ThreadId,
}

static CAPTURED: once_cell::sync::Lazy<std::sync::Mutex<Vec<(std::thread::ThreadId, log::Level, String)>>> =
    once_cell::sync::Lazy::new(Default::default);

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let entry = (std::thread::current().id(), record.level(), record.args().to_string());
            CAPTURED.lock().unwrap().push(entry);
        }
    }

    fn flush(&self) {}
}

impl LogCapture {
    /// Installs the capturing logger once and forgets earlier lines from this thread
    pub fn start() -> Self {
        static INSTALL: std::sync::Once = std::sync::Once::new();
        INSTALL.call_once(|| {
            log::set_logger(&CaptureLogger).unwrap();
            log::set_max_level(log::LevelFilter::Warn);
        });
        let thread = std::thread::current().id();
        CAPTURED.lock().unwrap().retain(|(id, _, _)| *id != thread);
        Self { thread }
    }

    pub fn warnings(&self) -> Vec<String> {
        CAPTURED
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, level, _)| *id == self.thread && *level == log::Level::Warn)
            .map(|(_, _, message)| message.clone())
            .collect()
    }
}
