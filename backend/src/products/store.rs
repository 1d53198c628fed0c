//! Persistence of the product list.
//!
//! The whole list is stored as one JSON document under a single well-known
//! key and rewritten on every change.

use common::model::product::LineItem;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;
use thiserror::Error;

/// Key of the persisted product list.
pub const PRODUCTS_KEY: &str = "products";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored product list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(test)]
    #[error("product store lock poisoned")]
    Poisoned,
}

pub trait ProductRepository: Send + Sync {
    fn load(&self) -> Result<Vec<LineItem>, StoreError>;
    fn save(&self, items: &[LineItem]) -> Result<(), StoreError>;
}

/// SQLite key/value table holding the serialized list.
pub struct SqliteProductStore {
    path: PathBuf,
}

impl SqliteProductStore {
    /// Opens (and if needed creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self { path })
    }
}

impl ProductRepository for SqliteProductStore {
    fn load(&self) -> Result<Vec<LineItem>, StoreError> {
        let conn = Connection::open(&self.path)?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![PRODUCTS_KEY],
                |row| row.get(0),
            )
            .optional()?;
        match stored {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, items: &[LineItem]) -> Result<(), StoreError> {
        let json = serde_json::to_string(items)?;
        let conn = Connection::open(&self.path)?;
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
            params![PRODUCTS_KEY, json],
        )?;
        Ok(())
    }
}

/// Volatile store, used by tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryProductStore {
    items: Mutex<Vec<LineItem>>,
    saves: Mutex<usize>,
}

#[cfg(test)]
impl MemoryProductStore {
    pub fn with_items(items: Vec<LineItem>) -> Self {
        Self {
            items: Mutex::new(items),
            saves: Mutex::new(0),
        }
    }

    /// Number of times the list has been written.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

#[cfg(test)]
impl ProductRepository for MemoryProductStore {
    fn load(&self) -> Result<Vec<LineItem>, StoreError> {
        self.items
            .lock()
            .map(|items| items.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, items: &[LineItem]) -> Result<(), StoreError> {
        *self.items.lock().map_err(|_| StoreError::Poisoned)? = items.to_vec();
        *self.saves.lock().map_err(|_| StoreError::Poisoned)? += 1;
        Ok(())
    }
}

#[cfg(test)]
impl<T: ProductRepository + ?Sized> ProductRepository for std::sync::Arc<T> {
    fn load(&self) -> Result<Vec<LineItem>, StoreError> {
        (**self).load()
    }

    fn save(&self, items: &[LineItem]) -> Result<(), StoreError> {
        (**self).save(items)
    }
}
