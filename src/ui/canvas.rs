use crate::core::geo::{LatLng, Point};
use crate::data::feature::Geometry;
use crate::map::engine::Cursor;
use crate::map::headless::HeadlessMap;
use crate::style::{ColorExpression, LayerType};
use crate::ui::style::{color32, PanelStyle};
use egui::{Color32, CursorIcon, Mesh, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2};
use geo::TriangulateEarcut;
use geo_types::{LineString, Polygon};

/// Pointer activity over the canvas, in container pixels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasResponse {
    /// Canvas size this frame; the map should be resized to it
    pub size: Point,
    pub clicked: Option<Point>,
    pub hovered: Option<Point>,
    /// The pointer is not over the canvas
    pub outside: bool,
}

/// Paints the visible style layers of `map` bottom to top.
///
/// Fill layers use their fill color at a third of its alpha with a solid
/// outline; line and circle layers use their color directly. Layer filters
/// are honored so the highlight layer shows only the highlighted feature.
pub fn map_canvas(ui: &mut Ui, map: &HeadlessMap, style: &PanelStyle) -> CanvasResponse {
    let size = ui.available_size();
    let (response, painter) = ui.allocate_painter(size, Sense::click());
    let rect = response.rect;
    painter.rect_filled(rect, 0.0, style.canvas_background);

    if let Some(snapshot) = map.style_snapshot() {
        for layer in &snapshot.layers {
            if !layer.visibility().is_visible() {
                continue;
            }
            let Some(source) = layer.source.as_deref().and_then(|id| map.source(id)) else {
                continue;
            };
            let expression = layer.color_property().map(ColorExpression::parse);
            for feature in &source.features {
                let Some(geometry) = &feature.geometry else {
                    continue;
                };
                if !map.passes_filter(&layer.id, &feature.properties) {
                    continue;
                }
                let color = expression
                    .as_ref()
                    .and_then(|expression| expression.color_for(&feature.properties))
                    .and_then(color32)
                    .unwrap_or(style.fallback_color);
                let to_screen = |position: &[f64; 2]| {
                    let pixel = map.pixel_of(&LatLng::from_position(*position));
                    rect.min + Vec2::new(pixel.x as f32, pixel.y as f32)
                };
                paint_geometry(&painter, geometry, layer.layer_type, color, style, &to_screen);
            }
        }
    }

    if map.cursor() == Cursor::Pointer && response.hovered() {
        ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
    }

    let local = |pos: Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);
    CanvasResponse {
        size: Point::new(rect.width() as f64, rect.height() as f64),
        clicked: response
            .clicked()
            .then(|| response.interact_pointer_pos())
            .flatten()
            .map(local),
        hovered: response.hover_pos().map(local),
        outside: response.hover_pos().is_none(),
    }
}

fn paint_geometry(
    painter: &Painter,
    geometry: &Geometry,
    layer_type: LayerType,
    color: Color32,
    style: &PanelStyle,
    to_screen: &dyn Fn(&[f64; 2]) -> Pos2,
) {
    let ring = |positions: &[[f64; 2]]| positions.iter().map(to_screen).collect::<Vec<_>>();
    match geometry {
        Geometry::Point { coordinates } => paint_point(painter, to_screen(coordinates), color),
        Geometry::MultiPoint { coordinates } => {
            for position in coordinates {
                paint_point(painter, to_screen(position), color);
            }
        }
        Geometry::LineString { coordinates } => {
            painter.add(Shape::line(ring(coordinates.as_slice()), Stroke::new(style.feature_stroke_width, color)));
        }
        Geometry::MultiLineString { coordinates } => {
            for line in coordinates {
                painter.add(Shape::line(ring(line.as_slice()), Stroke::new(style.feature_stroke_width, color)));
            }
        }
        Geometry::Polygon { coordinates } => paint_polygon(painter, coordinates, layer_type, color, style, &ring),
        Geometry::MultiPolygon { coordinates } => {
            for polygon in coordinates {
                paint_polygon(painter, polygon, layer_type, color, style, &ring);
            }
        }
        Geometry::GeometryCollection { geometries } => {
            for geometry in geometries {
                paint_geometry(painter, geometry, layer_type, color, style, to_screen);
            }
        }
    }
}

fn paint_point(painter: &Painter, center: Pos2, color: Color32) {
    painter.circle_filled(center, 4.0, color);
}

fn paint_polygon(
    painter: &Painter,
    rings: &[Vec<[f64; 2]>],
    layer_type: LayerType,
    color: Color32,
    style: &PanelStyle,
    ring: &dyn Fn(&[[f64; 2]]) -> Vec<Pos2>,
) {
    let Some(exterior) = rings.first() else {
        return;
    };
    let outline = ring(exterior);
    if outline.len() < 3 {
        return;
    }
    let clip = painter.clip_rect();
    if !Rect::from_points(&outline).intersects(clip) {
        return;
    }

    let holes: Vec<Vec<Pos2>> = rings[1..].iter().map(|hole| ring(hole)).collect();
    if layer_type == LayerType::Fill {
        let fill = color.linear_multiply(0.33);
        painter.add(Shape::mesh(fill_mesh(&outline, &holes, fill)));
    }
    painter.add(Shape::closed_line(outline, Stroke::new(style.feature_stroke_width, color)));
    for hole in holes {
        painter.add(Shape::closed_line(hole, Stroke::new(1.0, color)));
    }
}

/// Ear-cut triangulation of a screen-space polygon; outlines are often concave
fn fill_mesh(exterior: &[Pos2], holes: &[Vec<Pos2>], fill: Color32) -> Mesh {
    let line = |points: &[Pos2]| {
        LineString::from(
            points
                .iter()
                .map(|p| (p.x as f64, p.y as f64))
                .collect::<Vec<_>>(),
        )
    };
    let polygon = Polygon::new(line(exterior), holes.iter().map(|hole| line(hole)).collect());

    let mut mesh = Mesh::default();
    for triangle in polygon.earcut_triangles() {
        let base = mesh.vertices.len() as u32;
        for corner in triangle.to_array() {
            mesh.colored_vertex(egui::pos2(corner.x as f32, corner.y as f32), fill);
        }
        mesh.add_triangle(base, base + 1, base + 2);
    }
    mesh
}
