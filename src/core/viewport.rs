use crate::core::geo::{LatLng, LatLngBounds, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Square tile size used for the zoom-0 world
const TILE_SIZE: f64 = 256.0;

/// Camera position the map can jump to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: LatLng,
    pub zoom: f64,
}

impl Camera {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }
}

/// Padding in pixels around fitted bounds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Padding {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

/// Options for fitting the camera to bounds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraOptions {
    pub padding: Padding,
    /// Pixel offset of the bounds center relative to the map center
    pub offset: Point,
}

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, 22.0),
            size,
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }

    /// Sets the center of the viewport, clamped to the projectable world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(
            LatLng::clamp_lat(center.lat),
            center.lng.clamp(-180.0, 180.0),
        );
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    pub fn jump_to(&mut self, camera: Camera) {
        self.set_center(camera.center);
        self.set_zoom(camera.zoom);
    }

    pub fn camera(&self) -> Camera {
        Camera::new(self.center, self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level (EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let scale = TILE_SIZE * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let lat = LatLng::clamp_lat(lat_lng.lat).to_radians();

        let x = (lat_lng.lng + 180.0) / 360.0 * scale;
        let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0 * scale;

        Point::new(x, y)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let scale = TILE_SIZE * 2_f64.powf(zoom.unwrap_or(self.zoom));

        let lng = pixel.x / scale * 360.0 - 180.0;
        let n = PI - 2.0 * PI * pixel.y / scale;
        let lat = n.sinh().atan().to_degrees();

        LatLng::new(lat, lng)
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let origin = self.project(&self.center, None);
        let projected = self.project(lat_lng, None);
        projected
            .subtract(&origin)
            .add(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let origin = self.project(&self.center, None);
        let world = pixel
            .subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
            .add(&origin);
        self.unproject(&world, None)
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Computes the camera that fits `bounds` inside the padded viewport.
    ///
    /// Returns `None` when the padding leaves no room. Degenerate bounds
    /// (a single point) fit at `max_zoom`.
    pub fn camera_for_bounds(&self, bounds: &LatLngBounds, options: &CameraOptions) -> Option<Camera> {
        let padding = options.padding;
        let available = Point::new(
            self.size.x - padding.left - padding.right,
            self.size.y - padding.top - padding.bottom,
        );
        if available.x <= 0.0 || available.y <= 0.0 {
            return None;
        }

        let nw = self.project(&LatLng::new(bounds.north(), bounds.west()), Some(0.0));
        let se = self.project(&LatLng::new(bounds.south(), bounds.east()), Some(0.0));
        let width = (se.x - nw.x).abs();
        let height = (se.y - nw.y).abs();

        let scale_x = if width > 0.0 { available.x / width } else { f64::INFINITY };
        let scale_y = if height > 0.0 { available.y / height } else { f64::INFINITY };
        let zoom = scale_x.min(scale_y).log2().min(self.max_zoom);
        if !zoom.is_finite() {
            return None;
        }

        let shift = options.offset.add(&Point::new(
            (padding.left - padding.right) / 2.0,
            (padding.top - padding.bottom) / 2.0,
        ));
        let center_px = self.project(&bounds.center(), Some(zoom)).subtract(&shift);
        let center = self.unproject(&center_px, Some(zoom));

        Some(Camera::new(center, zoom))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(42.0, -93.5), 6.0, Point::new(1200.0, 800.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(LatLng::new(42.0, -93.5), 7.0, Point::new(800.0, 600.0));

        assert_eq!(viewport.zoom, 7.0);
        assert_eq!(viewport.center.lat, 42.0);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_coordinate_conversion() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let center_lat_lng = viewport.pixel_to_lat_lng(&Point::new(256.0, 256.0));
        assert!(center_lat_lng.lat.abs() < 0.01);
        assert!(center_lat_lng.lng.abs() < 0.01);

        let there = LatLng::new(41.5, -92.25);
        let back = viewport.pixel_to_lat_lng(&viewport.lat_lng_to_pixel(&there));
        assert!((back.lat - there.lat).abs() < 1e-9);
        assert!((back.lng - there.lng).abs() < 1e-9);
    }

    #[test]
    fn test_jump_to_clamps_camera() {
        let mut viewport = Viewport::default();
        viewport.jump_to(Camera::new(LatLng::new(89.0, -93.5), 30.0));

        assert_eq!(viewport.zoom, 22.0);
        assert_eq!(viewport.center.lat, crate::core::geo::MAX_LATITUDE);
        assert_eq!(viewport.camera().center.lng, -93.5);
    }

    #[test]
    fn test_camera_for_bounds_fits_inside_viewport() {
        let viewport = Viewport::new(LatLng::new(42.0, -93.5), 6.0, Point::new(800.0, 600.0));
        let bounds = LatLngBounds::from_coords(41.0, -94.0, 42.0, -93.0);

        let camera = viewport
            .camera_for_bounds(&bounds, &CameraOptions::default())
            .unwrap();
        let fitted = Viewport::new(camera.center, camera.zoom, viewport.size);
        let sw = fitted.lat_lng_to_pixel(&bounds.south_west);
        let ne = fitted.lat_lng_to_pixel(&bounds.north_east);

        assert!((ne.x - sw.x) <= 800.0 + 1e-6);
        assert!((sw.y - ne.y) <= 600.0 + 1e-6);
        assert!((camera.center.lng - bounds.center().lng).abs() < 1e-6);
    }

    #[test]
    fn test_camera_for_point_bounds_uses_max_zoom() {
        let viewport = Viewport::default();
        let point = LatLng::new(42.0, -93.5);
        let camera = viewport
            .camera_for_bounds(&LatLngBounds::new(point, point), &CameraOptions::default())
            .unwrap();
        assert_eq!(camera.zoom, viewport.max_zoom);
    }

    #[test]
    fn test_camera_for_bounds_without_room() {
        let viewport = Viewport::new(LatLng::default(), 3.0, Point::new(10.0, 10.0));
        let options = CameraOptions {
            padding: Padding::new(5.0, 5.0, 5.0, 5.0),
            ..Default::default()
        };
        let bounds = LatLngBounds::from_coords(0.0, 0.0, 1.0, 1.0);
        assert!(viewport.camera_for_bounds(&bounds, &options).is_none());
    }
}
