//! Camera framing for a clicked feature.
//!
//! The popup is anchored above the feature, so the camera zooms out in
//! proportion to the feature height and lifts the center a little.

use crate::core::config::CameraConfig;
use crate::core::geo::{LatLng, LatLngBounds, Point};
use crate::core::viewport::{Camera, CameraOptions};
use crate::map::engine::MapEngine;
use log::{debug, warn};

/// Where the camera should jump after a popup opens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFraming {
    pub center: LatLng,
    pub zoom: f64,
}

impl CameraFraming {
    pub fn camera(&self) -> Camera {
        Camera::new(self.center, self.zoom)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CameraFitCalculator {
    config: CameraConfig,
}

impl CameraFitCalculator {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Framing for `bounds`, or `None` (no camera move) without bounds.
    ///
    /// The zoom is always finite and within the configured range.
    pub fn compute_framing<M: MapEngine + ?Sized>(
        &self,
        bounds: Option<&LatLngBounds>,
        current_zoom: f64,
        map: &M,
    ) -> Option<CameraFraming> {
        let bounds = bounds?;
        let height = bounds.height();
        let center = bounds.center();
        if !height.is_finite() || !center.is_finite() {
            warn!("Feature bounds are not finite; camera left in place");
            return None;
        }

        let options = CameraOptions {
            padding: self.config.padding,
            offset: Point::new(0.0, height),
        };
        let candidate = map
            .camera_for_bounds(bounds, &options)
            .map(|fitted| round_tenth(fitted.zoom - self.config.height_zoom_factor * height))
            .filter(|zoom| zoom.is_finite());

        let zoom = match candidate {
            Some(zoom) if zoom == round_tenth(current_zoom) => current_zoom,
            Some(zoom) => zoom,
            None if current_zoom.is_finite() => current_zoom,
            None => self.config.min_zoom,
        };
        let zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);

        let lifted = LatLng::new(
            LatLng::clamp_lat(center.lat + self.config.center_lift_fraction * height),
            LatLng::wrap_lng(center.lng),
        );
        debug!(
            "Framing feature of height {:.4} at zoom {} (candidate {:?})",
            height, zoom, candidate
        );

        Some(CameraFraming {
            center: lifted,
            zoom,
        })
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
