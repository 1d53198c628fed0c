//! Runtime configuration read from the environment (and `.env` when present).

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CATALOG_URL: &str = "https://inventorybackend-m1z8.onrender.com/api/product";
const DEFAULT_ORDERS_BASE_URL: &str = "https://return-inventory-backend.onrender.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Endpoint returning the full product catalog as a JSON array.
    pub catalog_url: String,
    /// Base URL of the order-scan and press-table API.
    pub orders_base_url: String,
    pub database_path: PathBuf,
    /// Directory holding `{font_family}-Regular.ttf` and friends.
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub output_dir: PathBuf,
    /// Pages rendered between cooperative yields; 0 disables yielding.
    pub yield_every: usize,
    /// How long a finished export and its PDF are kept.
    pub export_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value })?,
            None => 8080,
        };
        let yield_every = match lookup("YIELD_EVERY") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "YIELD_EVERY", value })?,
            None => 20,
        };
        let export_ttl = match lookup("EXPORT_TTL_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid { var: "EXPORT_TTL_SECS", value })?,
            None => Duration::from_secs(3600),
        };

        Ok(Self {
            host: text("HOST", "127.0.0.1"),
            port,
            catalog_url: text("CATALOG_URL", DEFAULT_CATALOG_URL),
            orders_base_url: text("ORDERS_BASE_URL", DEFAULT_ORDERS_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            database_path: PathBuf::from(text("DATABASE_PATH", "labels.sqlite")),
            fonts_dir: PathBuf::from(text("FONTS_DIR", "./fonts")),
            font_family: text("FONT_FAMILY", "LiberationSans"),
            output_dir: PathBuf::from(text("OUTPUT_DIR", "./pdfs")),
            yield_every,
            export_ttl,
        })
    }
}
