//! Legend derived from the live style.
//!
//! The legend is never patched. Every refresh clears it and rebuilds it from
//! the style snapshot, so calling refresh any number of times with the same
//! style yields the same legend.

pub mod signal;

use crate::constants::OTHER_SENTINEL;
use crate::controls::LayerGroups;
use crate::core::config::LegendConfig;
use crate::core::html::escape;
use crate::style::{ColorExpression, LayerType, StyleLayer, StyleSnapshot};
use log::{debug, error};

/// Group label to layer ids, in legend order
pub type LegendGroups = LayerGroups;

/// Shape of a legend key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Swatch {
    #[default]
    Square,
    Circle,
}

impl Swatch {
    fn for_layer(layer: &StyleLayer) -> Self {
        match layer.layer_type {
            LayerType::Circle => Swatch::Circle,
            _ => Swatch::Square,
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            Swatch::Square => "legend-key",
            Swatch::Circle => "legend-key-circle",
        }
    }
}

/// One (color, label) row
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
    pub swatch: Swatch,
}

/// Rows contributed by one layer
#[derive(Debug, Clone, PartialEq)]
pub struct LegendBlock {
    /// Set on the first block of a group, unless the group is headingless
    pub heading: Option<String>,
    pub group: String,
    pub layer_id: String,
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Legend {
    pub blocks: Vec<LegendBlock>,
}

impl Legend {
    pub fn entries(&self) -> impl Iterator<Item = &LegendEntry> {
        self.blocks.iter().flat_map(|block| block.entries.iter())
    }

    pub fn row_count(&self) -> usize {
        self.blocks.iter().map(|block| block.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Legend container contents as an HTML fragment
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for block in &self.blocks {
            if let Some(heading) = &block.heading {
                html.push_str(&format!(
                    "<div class=\"legend-group\"><span>{}</span></div>\n",
                    escape(heading)
                ));
            }
            for entry in &block.entries {
                html.push_str(&format!(
                    "<div><span class=\"{}\" style=\"background-color: {}\"></span><span>{}</span></div>\n",
                    entry.swatch.css_class(),
                    escape(&entry.color),
                    escape(&entry.label).replace('\n', "<br>")
                ));
            }
            html.push_str("<div class=\"legend-gap\"></div>\n");
        }
        html
    }
}

/// Keeps a [`Legend`] in step with the map style
#[derive(Debug, Clone, Default)]
pub struct LegendSynchronizer {
    config: LegendConfig,
    legend: Legend,
}

impl LegendSynchronizer {
    pub fn new(config: LegendConfig) -> Self {
        Self {
            config,
            legend: Legend::default(),
        }
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    /// Rebuilds the legend from `style`.
    ///
    /// Each visible member layer of each group contributes a block. Hidden and
    /// missing layers contribute nothing. Without a style the previous legend
    /// is kept.
    pub fn refresh(&mut self, style: Option<&StyleSnapshot>, groups: &LegendGroups) -> &Legend {
        let Some(style) = style else {
            error!("Map style or layers not found; legend left unchanged");
            return &self.legend;
        };

        let mut blocks: Vec<LegendBlock> = Vec::new();
        for group in groups.iter() {
            let mut group_started = false;
            for layer_id in &group.layer_ids {
                let Some(layer) = style.layer(layer_id) else {
                    continue;
                };
                if !layer.visibility().is_visible() {
                    continue;
                }

                let entries = self.entries_for(&group.label, layer);
                if entries.is_empty() {
                    continue;
                }
                // Fill and outline layers sharing one ramp are listed once
                let repeats_previous = group_started
                    && blocks
                        .last()
                        .is_some_and(|previous| previous.entries == entries);
                if repeats_previous {
                    continue;
                }

                let heading = (!group_started && !self.config.is_headingless(&group.label))
                    .then(|| group.label.clone());
                group_started = true;
                blocks.push(LegendBlock {
                    heading,
                    group: group.label.clone(),
                    layer_id: layer.id.clone(),
                    entries,
                });
            }
        }

        debug!("Legend rebuilt with {} blocks", blocks.len());
        self.legend = Legend { blocks };
        &self.legend
    }

    fn entries_for(&self, group: &str, layer: &StyleLayer) -> Vec<LegendEntry> {
        let Some(color) = layer.color_property() else {
            return Vec::new();
        };
        let swatch = Swatch::for_layer(layer);
        let entry = |color: &str, label: &str| LegendEntry {
            color: color.to_string(),
            label: clean_label(label),
            swatch,
        };

        match ColorExpression::parse(color) {
            ColorExpression::Literal(color) => vec![entry(&color, group)],
            ColorExpression::Match { cases, .. } => cases
                .iter()
                .filter(|(label, _)| !label.matches(OTHER_SENTINEL))
                .map(|(label, color)| {
                    let display = label.display();
                    entry(color, self.config.translate(group, &display))
                })
                .collect(),
            ColorExpression::Interpolate { stops, .. } => stops
                .iter()
                .map(|stop| entry(&stop.color, &stop.value))
                .collect(),
            ColorExpression::Step { base, stops, .. } => {
                let base_label = match stops.first() {
                    Some(first) => format!("< {}", first.value),
                    None => group.to_string(),
                };
                std::iter::once(entry(&base, &base_label))
                    .chain(
                        stops
                            .iter()
                            .map(|stop| entry(&stop.color, &format!("≥ {}", stop.value))),
                    )
                    .collect()
            }
            ColorExpression::Unsupported => {
                debug!("Layer {} has a color expression the legend cannot list", layer.id);
                Vec::new()
            }
        }
    }
}

/// `<br>` becomes a line break and pandas' `NaT` placeholder disappears
fn clean_label(label: &str) -> String {
    label.replace("<br>", "\n").replace("NaT", "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Visibility;
    use serde_json::json;

    fn grid_style() -> StyleSnapshot {
        StyleSnapshot::new(vec![StyleLayer::new("grid-status", LayerType::Fill).with_paint(
            "fill-color",
            json!([
                "match", ["get", "which_grid"],
                "0, 1, 2", "#ff0000",
                "All on MM", "#00ff00",
                "* other *", "rgba(0,0,0,0)",
                "#cccccc"
            ]),
        )])
    }

    fn grid_groups() -> LegendGroups {
        LegendGroups::from_pairs([("Grid Status", vec!["grid-status"])])
    }

    #[test]
    fn test_grid_status_rows_are_translated_and_skip_other() {
        let mut sync = LegendSynchronizer::new(LegendConfig::default());
        let legend = sync.refresh(Some(&grid_style()), &grid_groups());

        let rows: Vec<(&str, &str)> = legend
            .entries()
            .map(|e| (e.label.as_str(), e.color.as_str()))
            .collect();
        assert_eq!(rows, [("No Grids", "#ff0000"), ("All on MM", "#00ff00")]);
        assert_eq!(legend.blocks[0].heading.as_deref(), Some("Grid Status"));
    }

    #[test]
    fn test_hidden_layers_contribute_nothing() {
        let mut style = grid_style();
        style
            .layer_mut("grid-status")
            .unwrap()
            .set_visibility(Visibility::None);
        let mut sync = LegendSynchronizer::default();
        assert!(sync.refresh(Some(&style), &grid_groups()).is_empty());
    }

    #[test]
    fn test_missing_style_keeps_previous_legend() {
        let mut sync = LegendSynchronizer::new(LegendConfig::default());
        sync.refresh(Some(&grid_style()), &grid_groups());
        let before = sync.legend().clone();
        assert_eq!(sync.refresh(None, &grid_groups()), &before);
    }

    #[test]
    fn test_literal_circle_and_headingless_group() {
        let style = StyleSnapshot::new(vec![
            StyleLayer::new("updates", LayerType::Circle).with_paint("circle-color", json!("#abcdef")),
        ]);
        let groups = LegendGroups::from_pairs([("Updates", vec!["updates"])]);
        let mut sync = LegendSynchronizer::new(LegendConfig::default());
        let legend = sync.refresh(Some(&style), &groups);

        assert_eq!(legend.blocks[0].heading, None);
        assert_eq!(
            legend.blocks[0].entries,
            vec![LegendEntry {
                color: "#abcdef".into(),
                label: "Updates".into(),
                swatch: Swatch::Circle,
            }]
        );
    }

    #[test]
    fn test_identical_fill_and_outline_blocks_collapse() {
        let ramp = json!(["interpolate", ["linear"], ["get", "HUC8"], 1, "#111111", 2, "#222222"]);
        let style = StyleSnapshot::new(vec![
            StyleLayer::new("submittal-info", LayerType::Fill).with_paint("fill-color", ramp.clone()),
            StyleLayer::new("submittal-info_outline", LayerType::Line).with_paint("line-color", ramp),
        ]);
        let groups = LegendGroups::from_pairs([(
            "Submitted Proj Outlines",
            vec!["submittal-info", "submittal-info_outline"],
        )]);
        let mut sync = LegendSynchronizer::default();
        let legend = sync.refresh(Some(&style), &groups);
        assert_eq!(legend.blocks.len(), 1);
        assert_eq!(legend.row_count(), 2);
    }

    #[test]
    fn test_step_rows_and_label_cleanup() {
        let style = StyleSnapshot::new(vec![
            StyleLayer::new("pct", LayerType::Fill)
                .with_paint("fill-color", json!(["step", ["get", "pct"], "#000", 50, "#555"])),
            StyleLayer::new("dates", LayerType::Fill).with_paint(
                "fill-color",
                json!(["match", ["get", "d"], "Due<br>2024", "#123", "NaT", "#456", "#000"]),
            ),
        ]);
        let groups = LegendGroups::from_pairs([("Percent", vec!["pct"]), ("Dates", vec!["dates"])]);
        let mut sync = LegendSynchronizer::default();
        let legend = sync.refresh(Some(&style), &groups);

        let labels: Vec<&str> = legend.entries().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["< 50", "≥ 50", "Due\n2024", ""]);
        assert!(legend.to_html().contains("Due<br>2024"));
    }
}
