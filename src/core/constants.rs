//! Dashboard-wide constants shared by the legend, popup and camera code.

/// Match-expression case that paints "everything else" transparent; never listed in the legend.
pub const OTHER_SENTINEL: &str = "* other *";

/// Lowest zoom the popup framing may choose.
pub const FRAMING_MIN_ZOOM: f64 = 5.0;

/// Highest zoom the popup framing may choose.
pub const FRAMING_MAX_ZOOM: f64 = 11.0;

/// Fraction of the feature height the camera center is lifted above the feature center.
pub const CENTER_LIFT_FRACTION: f64 = 0.3;

/// Zoom levels removed per degree of feature height.
pub const HEIGHT_ZOOM_FACTOR: f64 = 2.0;

/// Popup anchor offset in pixels (x, y).
pub const POPUP_OFFSET: (f64, f64) = (0.0, -15.0);

/// Hit tolerance for line and point features in the headless engine, in pixels.
pub const HIT_TOLERANCE_PX: f64 = 3.0;

/// Fallback shown when the last-updated timestamp cannot be read.
pub const LAST_UPDATED_UNAVAILABLE: &str = "Unable to fetch the last updated timestamp.";
