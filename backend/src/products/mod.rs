//! The operator's list of products to label.
//!
//! Every entry gets its rack resolved against the catalog when it is added or
//! edited. The list is kept in memory, newest first, and written back to the
//! repository in full after each change.

pub mod bulk;
pub mod store;

use crate::catalog::resolver::resolve_rack_space;
use crate::catalog::CatalogSnapshot;
use chrono::{DateTime, Utc};
use common::model::product::{LineItem, Size, RACK_NOT_FOUND};
use log::info;
use store::{ProductRepository, StoreError};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("no product at position {0}")]
    NotFound(usize),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fields supplied by a scan or the manual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub style_number: u32,
    pub size: Size,
    pub quantity: u32,
    pub order_id: Option<u32>,
    pub parent_style_number: Option<u32>,
}

impl NewEntry {
    pub fn manual(style_number: u32, size: Size, quantity: u32) -> Self {
        Self {
            style_number,
            size,
            quantity,
            order_id: None,
            parent_style_number: None,
        }
    }
}

/// Turns an entry into a line item, resolving its rack.
pub fn build_line_item(
    entry: NewEntry,
    catalog: &CatalogSnapshot,
    now: DateTime<Utc>,
) -> Result<LineItem, ProductError> {
    if entry.quantity == 0 {
        return Err(ProductError::InvalidQuantity);
    }
    let rack_space = resolve_rack_space(entry.style_number, catalog)
        .map(|found| found.rack_space)
        .unwrap_or_else(|| RACK_NOT_FOUND.to_string());
    Ok(LineItem {
        style_number: entry.style_number,
        size: entry.size,
        quantity: entry.quantity,
        rack_space,
        date_added: now,
        order_id: entry.order_id,
        parent_style_number: entry.parent_style_number,
    })
}

pub struct ProductList {
    repo: Box<dyn ProductRepository>,
    items: Mutex<Vec<LineItem>>,
}

impl ProductList {
    /// Reads the persisted list once; later reads are served from memory.
    pub fn load(repo: Box<dyn ProductRepository>) -> Result<Self, StoreError> {
        let items = repo.load()?;
        info!("Loaded {} saved products", items.len());
        Ok(Self {
            repo,
            items: Mutex::new(items),
        })
    }

    pub async fn snapshot(&self) -> Vec<LineItem> {
        self.items.lock().await.clone()
    }

    /// Prepends a new entry and persists the list.
    pub async fn add(&self, entry: NewEntry, catalog: &CatalogSnapshot) -> Result<LineItem, ProductError> {
        let item = build_line_item(entry, catalog, Utc::now())?;
        let mut items = self.items.lock().await;
        let mut updated = Vec::with_capacity(items.len() + 1);
        updated.push(item.clone());
        updated.extend(items.iter().cloned());
        self.commit(&mut items, updated)?;
        Ok(item)
    }

    /// Replaces the entry at `index`, keeping its position in the list.
    ///
    /// The rack is resolved again and the timestamp refreshed; order fields of
    /// the old entry are kept when the edit does not supply them.
    pub async fn replace(
        &self,
        index: usize,
        mut entry: NewEntry,
        catalog: &CatalogSnapshot,
    ) -> Result<LineItem, ProductError> {
        let mut items = self.items.lock().await;
        let previous = items.get(index).ok_or(ProductError::NotFound(index))?;
        entry.order_id = entry.order_id.or(previous.order_id);
        entry.parent_style_number = entry.parent_style_number.or(previous.parent_style_number);

        let item = build_line_item(entry, catalog, Utc::now())?;
        let mut updated = items.clone();
        updated[index] = item.clone();
        self.commit(&mut items, updated)?;
        Ok(item)
    }

    pub async fn remove(&self, index: usize) -> Result<LineItem, ProductError> {
        let mut items = self.items.lock().await;
        if index >= items.len() {
            return Err(ProductError::NotFound(index));
        }
        let mut updated = items.clone();
        let removed = updated.remove(index);
        self.commit(&mut items, updated)?;
        Ok(removed)
    }

    /// Empties the list; returns how many entries were dropped.
    pub async fn clear(&self) -> Result<usize, ProductError> {
        let mut items = self.items.lock().await;
        let dropped = items.len();
        self.commit(&mut items, Vec::new())?;
        Ok(dropped)
    }

    fn commit(&self, current: &mut Vec<LineItem>, updated: Vec<LineItem>) -> Result<(), ProductError> {
        self.repo.save(&updated)?;
        *current = updated;
        Ok(())
    }
}
