//! # statusmap
//!
//! State synchronization for a flood-mapping production status dashboard.
//!
//! The map engine is treated as a black box behind [`MapEngine`]. On top of
//! it this crate keeps the legend, the layer-group checkboxes, the feature
//! popup and the camera framing consistent with the map's own style state
//! and with an externally fetched attribute table.

pub mod camera;
pub mod controls;
pub mod core;
pub mod data;
pub mod interaction;
pub mod legend;
pub mod map;
pub mod popup;
pub mod prelude;
pub mod style;
#[cfg(feature = "egui")]
pub mod ui;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::DashboardConfig,
    dashboard::Dashboard,
    geo::{LatLng, LatLngBounds, Point},
    viewport::{Camera, CameraOptions, Padding, Viewport},
};

pub use camera::{CameraFitCalculator, CameraFraming};
pub use controls::{GroupControl, LayerGroup, LayerGroupController, LayerGroups, ZoomTarget};
pub use data::{
    attributes::{AttributeFeed, AttributeLookup, AttributeRecord, AttributeStore},
    feature::{Feature, FeatureCollection, Geometry, RenderedFeature},
};
pub use interaction::{ClickOutcome, HighlightFilter, InteractionDispatcher};
pub use legend::{Legend, LegendBlock, LegendEntry, LegendGroups, LegendSynchronizer};
pub use map::{engine::MapEngine, events::MapEvent, headless::HeadlessMap};
pub use popup::{PopupContentBuilder, PopupSession, PopupViewModel};
pub use style::{ColorExpression, StyleLayer, StyleSnapshot, Visibility};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, StatusMapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum StatusMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = StatusMapError;

/// Initializes `env_logger` once; later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
