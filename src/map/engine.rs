use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::viewport::{Camera, CameraOptions};
use crate::data::feature::RenderedFeature;
use crate::popup::PopupViewModel;
use crate::style::{StyleSnapshot, Visibility};
use crate::Result;
use serde_json::Value;

/// Canvas cursor style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    /// CSS value for the canvas `cursor` style; the default is the empty string
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }
}

/// Opaque handle of a popup added to the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupHandle(pub u64);

/// Everything needed to place a popup
#[derive(Debug, Clone, PartialEq)]
pub struct PopupSpec {
    pub position: LatLng,
    /// Side of the popup that touches `position`
    pub anchor: String,
    /// Pixel offset from the anchor point
    pub offset: Point,
    pub content: PopupViewModel,
}

impl PopupSpec {
    pub fn html(&self) -> String {
        self.content.to_html()
    }
}

/// Operations the dashboard performs on a map.
///
/// Implementations wrap a real map (a Mapbox GL bridge, a native renderer) or
/// stand in for one, like [`crate::map::headless::HeadlessMap`]. Layers are
/// addressed by style layer id.
pub trait MapEngine {
    /// Current style, or `None` while no style is loaded
    fn style(&self) -> Option<StyleSnapshot>;

    fn has_layer(&self, layer_id: &str) -> bool;

    /// Layout visibility, `None` when the layer does not exist
    fn visibility(&self, layer_id: &str) -> Option<Visibility>;

    fn set_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<()>;

    /// Replaces the filter expression of a layer
    fn set_filter(&mut self, layer_id: &str, filter: Value) -> Result<()>;

    /// Features drawn at a container pixel by the given layers, topmost first
    fn query_rendered_features(&self, point: Point, layer_ids: &[String]) -> Vec<RenderedFeature>;

    fn zoom(&self) -> f64;

    /// The engine's own fit of a camera to bounds
    fn camera_for_bounds(&self, bounds: &LatLngBounds, options: &CameraOptions) -> Option<Camera>;

    fn jump_to(&mut self, camera: Camera);

    fn add_popup(&mut self, spec: PopupSpec) -> PopupHandle;

    /// Removing an unknown handle is a no-op
    fn remove_popup(&mut self, handle: PopupHandle);

    fn set_cursor(&mut self, cursor: Cursor);
}
