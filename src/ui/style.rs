use crate::style::color::parse_css_color;
use egui::{Color32, FontId, Stroke};

/// Look of the dashboard panels and the map canvas
#[derive(Debug, Clone)]
pub struct PanelStyle {
    /// Side length of a legend swatch
    pub swatch_size: f32,
    pub heading_font: FontId,
    pub body_font: FontId,
    pub text_color: Color32,
    /// Used for features whose color cannot be parsed
    pub fallback_color: Color32,
    pub feature_stroke_width: f32,
    /// Outline of the highlighted feature
    pub highlight_stroke: Stroke,
    pub canvas_background: Color32,
    pub popup_max_height: f32,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            swatch_size: 14.0,
            heading_font: FontId::proportional(13.0),
            body_font: FontId::proportional(12.0),
            text_color: Color32::from_gray(30),
            fallback_color: Color32::from_gray(140),
            feature_stroke_width: 1.5,
            highlight_stroke: Stroke::new(3.0, Color32::from_rgb(0, 196, 255)),
            canvas_background: Color32::from_rgb(236, 240, 243),
            popup_max_height: 260.0,
        }
    }
}

/// CSS color to egui; `None` for expressions and unknown names
pub fn color32(css: &str) -> Option<Color32> {
    parse_css_color(css).map(|[r, g, b, a]| Color32::from_rgba_unmultiplied(r, g, b, a))
}
