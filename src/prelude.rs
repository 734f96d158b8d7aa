//! Prelude module for common statusmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use statusmap::prelude::*;`

pub use crate::core::{
    config::{
        AttributeConfig, CameraConfig, ControlsConfig, DashboardConfig, InteractionConfig,
        LegendConfig,
        PopupConfig,
    },
    dashboard::Dashboard,
    geo::{LatLng, LatLngBounds, Point},
    viewport::{Camera, CameraOptions, Padding, Viewport},
};

pub use crate::camera::{CameraFitCalculator, CameraFraming};

pub use crate::controls::{
    toggle_layers, GroupControl, LayerGroup, LayerGroupController, LayerGroups, ZoomTarget,
};

pub use crate::data::{
    attributes::{
        AttributeFeed, AttributeFormat, AttributeLookup, AttributeRecord, AttributeStore,
        HttpAttributeFeed, StaticAttributeFeed,
    },
    feature::{Feature, FeatureCollection, FeatureId, Geometry, RenderedFeature},
    status::{fetch_last_updated, last_updated_text},
};

pub use crate::interaction::{ClickOutcome, Cursor, HighlightFilter, InteractionDispatcher};

pub use crate::legend::{
    signal::StyleChangeSignal, Legend, LegendBlock, LegendEntry, LegendGroups,
    LegendSynchronizer, Swatch,
};

pub use crate::map::{
    engine::{MapEngine, PopupHandle, PopupSpec},
    events::MapEvent,
    headless::HeadlessMap,
};

pub use crate::popup::{AddOns, PopupContentBuilder, PopupRow, PopupSession, PopupViewModel};

pub use crate::style::{ColorExpression, LayerType, StyleLayer, StyleSnapshot, Visibility};

pub use crate::{Error as StatusMapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
