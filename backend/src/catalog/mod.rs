//! Read-only product catalog snapshot and the client that fetches it.
//!
//! The catalog is fetched once at startup and then shared, unchanged, with
//! every request that needs rack or color information.

pub mod resolver;

use common::model::catalog::CatalogRecord;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Catalog records indexed by style code.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    records: Vec<CatalogRecord>,
    by_style: HashMap<u32, usize>,
}

impl CatalogSnapshot {
    /// Builds the index; when a style code repeats, the last record wins.
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        let mut by_style = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            by_style.insert(record.style_code, idx);
        }
        Self { records, by_style }
    }

    pub fn get(&self, style_code: u32) -> Option<&CatalogRecord> {
        self.by_style.get(&style_code).map(|&idx| &self.records[idx])
    }

    /// Primary color of a style, if the catalog knows it.
    pub fn color_of(&self, style_code: u32) -> Option<&str> {
        self.get(style_code)
            .map(|record| record.primary_color.trim())
            .filter(|color| !color.is_empty())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fetches the catalog from the remote product API.
pub struct CatalogClient {
    http: reqwest::Client,
    url: String,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub async fn fetch(&self) -> Result<CatalogSnapshot, CatalogError> {
        debug!("Fetching catalog from {}", self.url);
        let values: Vec<Value> = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(CatalogSnapshot::new(parse_records(values)))
    }
}

/// Keeps every element that reads as a `CatalogRecord`; the rest are logged
/// and skipped so one malformed product does not hide the whole catalog.
pub fn parse_records(values: Vec<Value>) -> Vec<CatalogRecord> {
    let total = values.len();
    let records: Vec<CatalogRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping catalog record #{}: {}", idx, e);
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!("Skipped {} of {} catalog records", total - records.len(), total);
    }
    records
}
