//! Typed view of the map style: layers, their visibility and their color expressions.
//!
//! The snapshot mirrors what the map engine reports from `getStyle()`. Paint
//! and layout properties stay as raw JSON so unknown properties survive; only
//! the pieces the legend and the layer controls read are given types.

pub mod color;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Layout visibility of a single layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    pub fn from_flag(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Fill,
    Line,
    Circle,
    Symbol,
    #[serde(other)]
    Other,
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerType::Fill => write!(f, "fill"),
            LayerType::Line => write!(f, "line"),
            LayerType::Circle => write!(f, "circle"),
            LayerType::Symbol => write!(f, "symbol"),
            LayerType::Other => write!(f, "other"),
        }
    }
}

/// One styled layer as reported by the map engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub layout: Map<String, Value>,
    #[serde(default)]
    pub paint: Map<String, Value>,
}

impl StyleLayer {
    pub fn new(id: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            layer_type,
            source: None,
            layout: Map::new(),
            paint: Map::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_paint(mut self, key: &str, value: Value) -> Self {
        self.paint.insert(key.to_string(), value);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.set_visibility(visibility);
        self
    }

    /// Layout visibility; an unset property means visible, as in the engine
    pub fn visibility(&self) -> Visibility {
        match self.layout.get("visibility").and_then(Value::as_str) {
            Some("none") => Visibility::None,
            _ => Visibility::Visible,
        }
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.layout.insert(
            "visibility".to_string(),
            Value::String(visibility.as_str().to_string()),
        );
    }

    /// The paint property the legend reads: `fill-color` when present,
    /// otherwise the first paint key mentioning `color`.
    pub fn color_property(&self) -> Option<&Value> {
        self.paint.get("fill-color").or_else(|| {
            self.paint
                .iter()
                .find(|(key, _)| key.contains("color"))
                .map(|(_, value)| value)
        })
    }
}

/// Snapshot of the map's style layers, in draw order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleSnapshot {
    #[serde(default)]
    pub layers: Vec<StyleLayer>,
}

impl StyleSnapshot {
    pub fn new(layers: Vec<StyleLayer>) -> Self {
        Self { layers }
    }

    /// Parses a style document; only `layers` is read
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::ParseError(format!("Invalid style document: {}", e)))
    }

    pub fn layer(&self, id: &str) -> Option<&StyleLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_mut(&mut self, id: &str) -> Option<&mut StyleLayer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }
}

/// Case label of a `match` expression
#[derive(Debug, Clone, PartialEq)]
pub enum MatchLabel {
    Single(String),
    /// `[a, b]` cases share one color
    Many(Vec<String>),
}

impl MatchLabel {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => MatchLabel::Many(items.iter().map(value_label).collect()),
            other => MatchLabel::Single(value_label(other)),
        }
    }

    pub fn display(&self) -> String {
        match self {
            MatchLabel::Single(label) => label.clone(),
            MatchLabel::Many(labels) => labels.join(", "),
        }
    }

    pub fn is(&self, label: &str) -> bool {
        matches!(self, MatchLabel::Single(own) if own == label)
    }

    /// True when a feature value selects this case
    pub fn matches(&self, value: &str) -> bool {
        match self {
            MatchLabel::Single(own) => own == value,
            MatchLabel::Many(labels) => labels.iter().any(|label| label == value),
        }
    }
}

/// A stop in a continuous or stepped ramp
#[derive(Debug, Clone, PartialEq)]
pub struct ColorStop {
    pub value: String,
    pub color: String,
}

/// Paint color property, classified for legend derivation
#[derive(Debug, Clone, PartialEq)]
pub enum ColorExpression {
    Literal(String),
    Match {
        input: Value,
        cases: Vec<(MatchLabel, String)>,
        fallback: String,
    },
    Interpolate {
        input: Value,
        stops: Vec<ColorStop>,
    },
    Step {
        input: Value,
        base: String,
        stops: Vec<ColorStop>,
    },
    Unsupported,
}

impl ColorExpression {
    pub fn parse(value: &Value) -> Self {
        let items = match value {
            Value::String(color) => return ColorExpression::Literal(color.clone()),
            Value::Array(items) => items,
            _ => return ColorExpression::Unsupported,
        };

        match items.first().and_then(Value::as_str) {
            // ["match", input, label1, color1, ..., fallback]
            Some("match") if items.len() >= 5 && (items.len() - 3) % 2 == 0 => {
                let cases = items[2..items.len() - 1]
                    .chunks_exact(2)
                    .map(|pair| (MatchLabel::from_value(&pair[0]), value_label(&pair[1])))
                    .collect();
                ColorExpression::Match {
                    input: items[1].clone(),
                    cases,
                    fallback: value_label(&items[items.len() - 1]),
                }
            }
            // ["interpolate", ["linear"], input, stop1, color1, ...]
            Some("interpolate") if items.len() >= 5 && (items.len() - 3) % 2 == 0 => {
                ColorExpression::Interpolate {
                    input: items[2].clone(),
                    stops: stops(&items[3..]),
                }
            }
            // ["step", input, base, stop1, color1, ...]
            Some("step") if items.len() >= 3 && (items.len() - 3) % 2 == 0 => ColorExpression::Step {
                input: items[1].clone(),
                base: value_label(&items[2]),
                stops: stops(&items[3..]),
            },
            _ => ColorExpression::Unsupported,
        }
    }
}

impl ColorExpression {
    /// Color painted for a feature with `properties`.
    ///
    /// Inputs may be `["get", field]`, optionally wrapped in `["to-number", ...]`.
    /// Interpolation does not blend: the nearest stop at or below the value wins.
    pub fn color_for(&self, properties: &Map<String, Value>) -> Option<&str> {
        match self {
            ColorExpression::Literal(color) => Some(color),
            ColorExpression::Match {
                input,
                cases,
                fallback,
            } => {
                let value = resolve_input(input, properties).map(value_label);
                let case = value.and_then(|value| cases.iter().find(|(label, _)| label.matches(&value)));
                Some(case.map_or(fallback.as_str(), |(_, color)| color.as_str()))
            }
            ColorExpression::Interpolate { input, stops } => {
                let value = resolve_input(input, properties).and_then(as_number);
                let below = value.and_then(|value| last_stop_at_or_below(stops, value));
                below.or_else(|| stops.first()).map(|stop| stop.color.as_str())
            }
            ColorExpression::Step { input, base, stops } => {
                let value = resolve_input(input, properties).and_then(as_number);
                let below = value.and_then(|value| last_stop_at_or_below(stops, value));
                Some(below.map_or(base.as_str(), |stop| stop.color.as_str()))
            }
            ColorExpression::Unsupported => None,
        }
    }
}

fn resolve_input<'a>(input: &Value, properties: &'a Map<String, Value>) -> Option<&'a Value> {
    match input.as_array()?.as_slice() {
        [op, field] if op == "get" => properties.get(field.as_str()?),
        [op, inner] if op == "to-number" => resolve_input(inner, properties),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn last_stop_at_or_below(stops: &[ColorStop], value: f64) -> Option<&ColorStop> {
    stops
        .iter()
        .filter(|stop| stop.value.parse::<f64>().is_ok_and(|at| at <= value))
        .last()
}

fn stops(pairs: &[Value]) -> Vec<ColorStop> {
    pairs
        .chunks_exact(2)
        .map(|pair| ColorStop {
            value: value_label(&pair[0]),
            color: value_label(&pair[1]),
        })
        .collect()
}

/// Renders a JSON scalar the way it reads in a legend or popup
pub fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
