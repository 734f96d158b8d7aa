//! Popup content assembly.
//!
//! Three sources are merged in a fixed order: the feature's own properties,
//! the attribute record joined on the feature identifier, then add-ons from
//! a secondary click target. A display label is emitted at most once; the
//! first source to produce it wins.

use crate::core::config::PopupConfig;
use crate::core::geo::LatLngBounds;
use crate::core::html::escape;
use crate::data::attributes::{AttributeLookup, AttributeRecord};
use crate::data::feature::{Feature, FeatureId};
use crate::prelude::HashSet;
use crate::style::value_label;
use log::{debug, warn};

/// Extra context gathered from other features under the click
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddOns(Vec<(String, String)>);

impl AddOns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key, replacing an earlier value for it
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupRow {
    pub label: String,
    pub value: String,
    /// Feature properties and add-ons are bold; attribute rows are not
    pub emphasized: bool,
}

/// Popup title, rows and the feature's bounds for camera framing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopupViewModel {
    pub title: String,
    pub rows: Vec<PopupRow>,
    pub bounds: Option<LatLngBounds>,
}

impl PopupViewModel {
    pub fn row(&self, label: &str) -> Option<&PopupRow> {
        self.rows.iter().find(|row| row.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<div class=\"popup-table-title\">{}</div>\n\
             <div class=\"popup-table-wrapper\">\n\
             <table id=\"this-popup-table\" class=\"popup-table\">\n\
             <thead><tr><th></th><th></th></tr></thead>\n<tbody>\n",
            escape(&self.title)
        );
        for row in &self.rows {
            let label = escape(&row.label);
            let label = if row.emphasized {
                format!("<strong>{}</strong>", label)
            } else {
                label
            };
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                label,
                escape(&row.value)
            ));
        }
        html.push_str("</tbody>\n</table>\n</div>\n");
        html
    }
}

/// Accumulates rows, dropping repeated display labels
struct RowSet {
    rows: Vec<PopupRow>,
    seen: HashSet<String>,
}

impl RowSet {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            seen: HashSet::default(),
        }
    }

    fn push(&mut self, label: String, value: String, emphasized: bool) {
        if self.seen.insert(label.clone()) {
            self.rows.push(PopupRow {
                label,
                value,
                emphasized,
            });
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PopupContentBuilder {
    config: PopupConfig,
}

impl PopupContentBuilder {
    pub fn new(config: PopupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PopupConfig {
        &self.config
    }

    /// Looks up the feature's record, then builds the popup
    pub async fn build<L: AttributeLookup + ?Sized>(
        &self,
        feature: &Feature,
        add_ons: &AddOns,
        store: &L,
    ) -> PopupViewModel {
        let record = match feature.identifier(&self.config.identifier_field) {
            Some(id) => store.lookup(&id).await,
            None => None,
        };
        self.build_with_record(feature, add_ons, record.as_ref())
    }

    /// Builds the popup from an already resolved record
    pub fn build_with_record(
        &self,
        feature: &Feature,
        add_ons: &AddOns,
        record: Option<&AttributeRecord>,
    ) -> PopupViewModel {
        let mut rows = RowSet::new();

        for (field, value) in &feature.properties {
            if self.config.is_denied(field) {
                continue;
            }
            let (label, value) = self.display(field, &value_label(value));
            rows.push(label, value, true);
        }

        match (feature.identifier(&self.config.identifier_field), record) {
            (None, _) => warn!(
                "Feature is missing {} for attribute matching",
                self.config.identifier_field
            ),
            (Some(id), None) => warn!("No additional attributes found for {}: {}", self.config.identifier_field, id),
            (Some(id), Some(record)) => self.merge_record(&mut rows, &id, record),
        }

        for (key, value) in add_ons.iter() {
            let (label, value) = self.display(key, value);
            rows.push(label, value, true);
        }

        PopupViewModel {
            title: self.config.title.clone(),
            rows: rows.rows,
            bounds: feature.bounds(),
        }
    }

    /// Record values that restate the identifier or the name are skipped
    fn merge_record(&self, rows: &mut RowSet, id: &FeatureId, record: &AttributeRecord) {
        let name = record.get(&self.config.name_field).unwrap_or(id.as_str());
        for (column, value) in record.iter() {
            if value == id.as_str() || value == name {
                debug!("Skipping {} restating the feature", column);
                continue;
            }
            let (label, value) = self.display(column, value);
            rows.push(label, value, false);
        }
    }

    /// Display label and value for a raw field
    pub fn display(&self, field: &str, value: &str) -> (String, String) {
        match self.config.translation(field) {
            Some(translation) => (
                translation.label.clone(),
                translation.translate(value).to_string(),
            ),
            None => (self.format_label(field), value.to_string()),
        }
    }

    /// Underscores to spaces, whitespace collapsed, then whole-word replacements
    pub fn format_label(&self, field: &str) -> String {
        let spaced = field.replace('_', " ");
        let mut label = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
        for (from, to) in &self.config.label_replacements {
            label = replace_words(&label, from, to);
        }
        label
    }
}

fn replace_words(label: &str, from: &str, to: &str) -> String {
    let pattern: Vec<&str> = from.split_whitespace().collect();
    if pattern.is_empty() {
        return label.to_string();
    }
    let words: Vec<&str> = label.split(' ').collect();
    let mut out: Vec<&str> = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        if words[i..].starts_with(&pattern) {
            out.push(to);
            i += pattern.len();
        } else {
            out.push(words[i]);
            i += 1;
        }
    }
    out.join(" ")
}
