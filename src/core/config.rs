//! Dashboard configuration
//!
//! One JSON document with a section per component. Every section has
//! defaults matching the production status dashboard, so an empty `{}`
//! is a complete configuration.

use crate::controls::LayerGroups;
use crate::core::viewport::Padding;
use crate::data::attributes::AttributeFormat;
use crate::prelude::HashMap;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid assignment codes to the phrases shown in the legend and popups
pub static GRID_LABELS: Lazy<HashMap<String, String>> = Lazy::new(|| {
    [
        ("0, 1, 2", "No Grids"),
        ("1, 2", "DRAFT, Add'l Ret"),
        ("2", "Add'l Ret"),
        ("All on MM", "All on MM"),
    ]
    .into_iter()
    .map(|(code, label)| (code.to_string(), label.to_string()))
    .collect()
});

static DENY_FIELDS: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "OID_",
        "OID",
        "OBJECTID",
        "GlobalID",
        "Shape__Area",
        "Shape__Length",
        "Shape__Are",
        "Shape__Len",
        "Shape__Area_",
        "States",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

static DENY_SUBSTRINGS: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "area", "acre", "sq_k", "final", "tie", "nee", "_ac", "mo", "shape", " ac", "global",
        "legend",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub popup: PopupConfig,
    pub interaction: InteractionConfig,
    pub camera: CameraConfig,
    pub legend: LegendConfig,
    pub controls: ControlsConfig,
    pub attributes: AttributeConfig,
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;
        if self.popup.identifier_field.is_empty() {
            return Err(Error::Config("popup.identifier_field is empty".to_string()));
        }
        if self.attributes.key_column.is_empty() {
            return Err(Error::Config("attributes.key_column is empty".to_string()));
        }
        Ok(())
    }
}

/// A field whose label and value are both rewritten, like `which_grid`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTranslation {
    pub field: String,
    pub label: String,
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl FieldTranslation {
    /// Translated value, or the value itself when the table has no entry
    pub fn translate<'a>(&'a self, value: &'a str) -> &'a str {
        self.values.get(value).map(String::as_str).unwrap_or(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub title: String,
    /// Property joining a feature to its attribute record
    pub identifier_field: String,
    /// Record column holding the display name
    pub name_field: String,
    pub deny_fields: Vec<String>,
    /// Matched case-insensitively anywhere in the field name
    pub deny_substrings: Vec<String>,
    /// Whole-word label replacements, applied in order
    pub label_replacements: Vec<(String, String)>,
    pub translations: Vec<FieldTranslation>,
}

impl PopupConfig {
    pub fn is_denied(&self, field: &str) -> bool {
        if self.deny_fields.iter().any(|denied| denied == field) {
            return true;
        }
        let lower = field.to_lowercase();
        self.deny_substrings
            .iter()
            .any(|part| lower.contains(&part.to_lowercase()))
    }

    pub fn translation(&self, field: &str) -> Option<&FieldTranslation> {
        self.translations.iter().find(|t| t.field == field)
    }
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            title: "Iowa BLE Area Info".to_string(),
            identifier_field: "HUC8".to_string(),
            name_field: "Name".to_string(),
            deny_fields: DENY_FIELDS.clone(),
            deny_substrings: DENY_SUBSTRINGS.clone(),
            label_replacements: vec![
                ("Su".to_string(), "Submit".to_string()),
                ("Mapping In".to_string(), "Ph1 Mapped By".to_string()),
                ("Perc".to_string(), "%".to_string()),
            ],
            translations: vec![FieldTranslation {
                field: "which_grid".to_string(),
                label: "Grids TODO".to_string(),
                values: GRID_LABELS.clone(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Fill layer whose features open popups
    pub primary_layer: String,
    /// Extra layers queried on click for add-on context
    pub secondary_layers: Vec<String>,
    pub highlight_layer: String,
    /// Property compared by the highlight filter
    pub highlight_field: String,
    /// A clicked feature carrying this property contributes add-ons
    pub add_on_marker: String,
    /// Property copied from that feature into the popup
    pub add_on_field: String,
    pub popup_anchor: String,
    pub popup_offset: [f64; 2],
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            primary_layer: "areas-interaction".to_string(),
            secondary_layers: vec!["model-outlines-mod".to_string()],
            highlight_layer: "areas-highlight".to_string(),
            highlight_field: "HUC8".to_string(),
            add_on_marker: "DS_1".to_string(),
            add_on_field: "Model_ID".to_string(),
            popup_anchor: "bottom".to_string(),
            popup_offset: [crate::constants::POPUP_OFFSET.0, crate::constants::POPUP_OFFSET.1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom levels removed per degree of feature height
    pub height_zoom_factor: f64,
    /// Share of the feature height the center is lifted by
    pub center_lift_fraction: f64,
    pub padding: Padding,
}

impl CameraConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_zoom.is_finite() || !self.max_zoom.is_finite() {
            return Err(Error::Config("camera zoom range must be finite".to_string()));
        }
        if self.min_zoom > self.max_zoom {
            return Err(Error::Config(format!(
                "camera.min_zoom {} is above camera.max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            min_zoom: FRAMING_MIN_ZOOM,
            max_zoom: FRAMING_MAX_ZOOM,
            height_zoom_factor: HEIGHT_ZOOM_FACTOR,
            center_lift_fraction: CENTER_LIFT_FRACTION,
            padding: Padding::new(5.0, 0.0, 5.0, 5.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub groups: LayerGroups,
    /// Groups whose rows are listed without a heading
    pub headingless_groups: Vec<String>,
    /// Per-group case label translations
    pub translations: HashMap<String, HashMap<String, String>>,
    /// Quiet period before a burst of style notifications triggers a refresh
    pub debounce_ms: u64,
}

impl LegendConfig {
    pub fn is_headingless(&self, group: &str) -> bool {
        self.headingless_groups.iter().any(|g| g == group)
    }

    pub fn translate<'a>(&'a self, group: &str, label: &'a str) -> &'a str {
        self.translations
            .get(group)
            .and_then(|table| table.get(label))
            .map(String::as_str)
            .unwrap_or(label)
    }
}

impl Default for LegendConfig {
    fn default() -> Self {
        let mut translations = HashMap::default();
        translations.insert("Grid Status".to_string(), GRID_LABELS.clone());
        Self {
            groups: LayerGroups::from_pairs([
                ("Draft MIP Status", vec!["draft-mip"]),
                ("FP MIP Status", vec!["fp-mip"]),
                ("Hydra MIP Status", vec!["hydraulics-mip"]),
                ("Production Status", vec!["prod-status"]),
                ("Grid Status", vec!["grid-status"]),
                ("FRP Status", vec!["frp-status"]),
                ("Mod Model Outlines", vec!["model-outlines-mod"]),
                ("Task Order Outline", vec!["work-areas"]),
            ]),
            headingless_groups: vec!["Updates".to_string(), "TODOs".to_string()],
            translations,
            debounce_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub groups: LayerGroups,
    /// Centroids JSON with per-group zoom targets
    pub zoom_targets_path: Option<String>,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            groups: LayerGroups::from_pairs([
                ("Draft MIP", vec!["draft-mip"]),
                ("FP MIP", vec!["fp-mip"]),
                ("Hydraulics MIP", vec!["hydraulics-mip"]),
                ("FRP Status", vec!["frp-status"]),
                ("Draft Status Detail", vec!["prod-status"]),
                ("Grid Status", vec!["grid-status"]),
                ("Mod Model Outlines", vec!["model-outlines-mod"]),
                (
                    "Submitted Proj Outlines",
                    vec!["submittal-info", "submittal-info_outline"],
                ),
                ("TO Areas", vec!["work-areas"]),
            ]),
            zoom_targets_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    pub url: Option<String>,
    pub format: AttributeFormat,
    pub key_column: String,
    /// Dataset whose `Last-Modified` header is shown as the status date
    pub last_updated_url: Option<String>,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            url: None,
            format: AttributeFormat::Csv,
            key_column: "project_id".to_string(),
            last_updated_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DashboardConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.popup.identifier_field, "HUC8");
        assert_eq!(config.attributes.key_column, "project_id");
        assert_eq!(config.camera.min_zoom, 5.0);
        assert_eq!(config.camera.max_zoom, 11.0);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = DashboardConfig::from_json_str(
            r#"{"popup": {"title": "Status"}, "camera": {"max_zoom": 12}}"#,
        )
        .unwrap();
        assert_eq!(config.popup.title, "Status");
        assert_eq!(config.popup.identifier_field, "HUC8");
        assert_eq!(config.camera.max_zoom, 12.0);
        assert_eq!(config.camera.min_zoom, 5.0);
    }

    #[test]
    fn test_inverted_zoom_range_is_rejected() {
        let result = DashboardConfig::from_json_str(r#"{"camera": {"min_zoom": 12, "max_zoom": 4}}"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_deny_list() {
        let popup = PopupConfig::default();
        assert!(popup.is_denied("OBJECTID"));
        assert!(popup.is_denied("Shape__Length"));
        assert!(popup.is_denied("Total_Acres"));
        assert!(popup.is_denied("LEGEND_CODE"));
        assert!(!popup.is_denied("HUC8"));
        assert!(!popup.is_denied("Draft_MIP"));
    }

    #[test]
    fn test_grid_translation() {
        let legend = LegendConfig::default();
        assert_eq!(legend.translate("Grid Status", "0, 1, 2"), "No Grids");
        assert_eq!(legend.translate("Grid Status", "unknown"), "unknown");
        assert_eq!(legend.translate("FRP Status", "0, 1, 2"), "0, 1, 2");

        let popup = PopupConfig::default();
        let grid = popup.translation("which_grid").unwrap();
        assert_eq!(grid.translate("1, 2"), "DRAFT, Add'l Ret");
    }
}
