//! Supplementary per-feature status records from the tracking table.
//!
//! The table arrives as CSV or JSON from a separate feed, is keyed by the
//! feature identifier and is replaced wholesale on every load. Records are
//! never patched in place.

use crate::data::feature::FeatureId;
use crate::prelude::HashMap;
use crate::style::value_label;
use crate::{Error, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered (column, value) pairs for one feature
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeRecord {
    fields: Vec<(String, String)>,
}

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Sets a column, replacing an existing value in place
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Wire format of the attribute feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttributeFormat {
    #[default]
    Csv,
    Json,
}

/// Raw body of one feed fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPayload {
    pub body: String,
    pub format: AttributeFormat,
}

/// Where the attribute table comes from
#[async_trait(?Send)]
pub trait AttributeFeed {
    async fn fetch(&self) -> Result<FeedPayload>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Fetches the table over HTTP
pub struct HttpAttributeFeed {
    client: reqwest::Client,
    url: String,
    format: AttributeFormat,
}

impl HttpAttributeFeed {
    pub fn new(url: impl Into<String>, format: AttributeFormat) -> Self {
        Self::with_client(reqwest::Client::new(), url, format)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>, format: AttributeFormat) -> Self {
        Self {
            client,
            url: url.into(),
            format,
        }
    }
}

#[async_trait(?Send)]
impl AttributeFeed for HttpAttributeFeed {
    async fn fetch(&self) -> Result<FeedPayload> {
        debug!("Fetching attributes from {}", self.url);
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(FeedPayload {
            body,
            format: self.format,
        })
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// In-memory table, for tests and bundled demo data
#[derive(Debug, Clone)]
pub struct StaticAttributeFeed {
    payload: FeedPayload,
}

impl StaticAttributeFeed {
    pub fn new(body: impl Into<String>, format: AttributeFormat) -> Self {
        Self {
            payload: FeedPayload {
                body: body.into(),
                format,
            },
        }
    }
}

#[async_trait(?Send)]
impl AttributeFeed for StaticAttributeFeed {
    async fn fetch(&self) -> Result<FeedPayload> {
        Ok(self.payload.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// Per-id lookup the popup path awaits; a network-backed store may suspend here
#[async_trait(?Send)]
pub trait AttributeLookup {
    async fn lookup(&self, id: &FeatureId) -> Option<AttributeRecord>;
}

/// Attribute records keyed by feature identifier
#[derive(Debug, Clone)]
pub struct AttributeStore {
    key_column: String,
    records: HashMap<FeatureId, AttributeRecord>,
    columns: Vec<String>,
}

impl AttributeStore {
    pub fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            records: HashMap::default(),
            columns: Vec::new(),
        }
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Parses `body` and replaces the whole store. On error the previous
    /// contents are kept.
    pub fn load(&mut self, body: &str, format: AttributeFormat) -> Result<usize> {
        let rows = match format {
            AttributeFormat::Csv => parse_csv(body, &self.key_column)?,
            AttributeFormat::Json => parse_json(body, &self.key_column)?,
        };
        self.replace(rows);
        Ok(self.records.len())
    }

    /// Re-runs the feed and replaces the store, e.g. after an upload completes
    pub async fn refresh(&mut self, feed: &dyn AttributeFeed) -> Result<usize> {
        let payload = feed.fetch().await?;
        let count = self.load(&payload.body, payload.format)?;
        info!("Loaded {} attribute records from {}", count, feed.describe());
        Ok(count)
    }

    fn replace(&mut self, rows: Vec<(FeatureId, AttributeRecord)>) {
        let mut columns: Vec<String> = Vec::new();
        let mut records = HashMap::default();
        for (id, record) in rows {
            for (column, _) in record.iter() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
            records.insert(id, record);
        }
        self.records = records;
        self.columns = columns;
    }

    pub fn get(&self, id: &FeatureId) -> Option<&AttributeRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every column seen, in first-seen order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records sorted by identifier, for tabular display
    pub fn sorted_records(&self) -> Vec<(&FeatureId, &AttributeRecord)> {
        let mut rows: Vec<_> = self.records.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }
}

#[async_trait(?Send)]
impl AttributeLookup for AttributeStore {
    async fn lookup(&self, id: &FeatureId) -> Option<AttributeRecord> {
        self.get(id).cloned()
    }
}

fn parse_csv(body: &str, key_column: &str) -> Result<Vec<(FeatureId, AttributeRecord)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());
    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == key_column) {
        return Err(Error::Config(format!(
            "attribute table has no '{}' column",
            key_column
        )));
    }

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record = AttributeRecord::from_pairs(headers.iter().zip(row.iter()));
        match record.get(key_column).filter(|key| !key.is_empty()) {
            Some(key) => rows.push((FeatureId::new(key), record)),
            None => debug!("Skipping attribute row without {}", key_column),
        }
    }
    Ok(rows)
}

fn parse_json(body: &str, key_column: &str) -> Result<Vec<(FeatureId, AttributeRecord)>> {
    fn record_of(fields: &serde_json::Map<String, Value>) -> AttributeRecord {
        AttributeRecord::from_pairs(fields.iter().map(|(k, v)| (k.clone(), value_label(v))))
    }

    match serde_json::from_str::<Value>(body)? {
        // {"07080104": {...}, ...}
        Value::Object(by_id) => Ok(by_id
            .iter()
            .filter_map(|(id, fields)| match fields {
                Value::Object(fields) => Some((FeatureId::new(id.as_str()), record_of(fields))),
                _ => {
                    warn!("Attribute entry {} is not an object", id);
                    None
                }
            })
            .collect()),
        // [{"project_id": ..., ...}, ...]
        Value::Array(rows) => Ok(rows
            .iter()
            .filter_map(|row| {
                let fields = row.as_object()?;
                let key = fields.get(key_column).map(value_label).filter(|k| !k.is_empty());
                match key {
                    Some(key) => Some((FeatureId::new(key), record_of(fields))),
                    None => {
                        debug!("Skipping attribute row without {}", key_column);
                        None
                    }
                }
            })
            .collect()),
        _ => Err(Error::ParseError(
            "attribute JSON must be an object or an array".to_string(),
        )),
    }
}
