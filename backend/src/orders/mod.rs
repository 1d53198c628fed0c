//! Client for the order-scan and press-table collaborators.
//!
//! An order id read by the scanner maps to a style/size pair. After an entry
//! is added to the product list, the matching press-table record (if any) is
//! moved to the ship table.

use async_trait::async_trait;
use common::model::lenient::{optional_u32_from_number_or_text, u32_from_number_or_text};
use common::model::product::Size;
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const ORDER_ID_DIGITS: usize = 5;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order id must be exactly 5 digits, got '{0}'")]
    InvalidOrderId(String),
    #[error("order {0} not found")]
    NotFound(u32),
    #[error("order {order_id} has an unknown size '{size}'")]
    UnknownSize { order_id: u32, size: String },
    #[error("order service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Style and size behind a scanned order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub order_id: u32,
    pub style_number: u32,
    pub size: Size,
    pub parent_style_number: Option<u32>,
}

/// Parses a scanned order id; only five-digit ids are looked up.
pub fn parse_order_id(raw: &str) -> Result<u32, OrderError> {
    let trimmed = raw.trim();
    if trimmed.len() != ORDER_ID_DIGITS || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OrderError::InvalidOrderId(raw.to_string()));
    }
    trimmed
        .parse()
        .map_err(|_| OrderError::InvalidOrderId(raw.to_string()))
}

#[async_trait]
pub trait OrderLookup: Send + Sync {
    async fn fetch_order(&self, order_id: u32) -> Result<OrderRecord, OrderError>;

    /// Moves the press-table record for `style_number`/`size` to shipping.
    /// Returns the order id that was shipped, or `None` if nothing matched.
    async fn ship_matching(&self, style_number: u32, size: Size) -> Result<Option<u32>, OrderError>;
}

#[derive(Debug, Deserialize)]
struct OrderPayload {
    #[serde(deserialize_with = "u32_from_number_or_text")]
    style_number: u32,
    size: String,
    #[serde(
        default,
        alias = "parentStyleNumber",
        deserialize_with = "optional_u32_from_number_or_text"
    )]
    parent_style_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PressTablePage {
    #[serde(default)]
    data: Vec<PressRecord>,
}

#[derive(Debug, Deserialize)]
struct PressRecord {
    #[serde(default, deserialize_with = "optional_u32_from_number_or_text")]
    order_id: Option<u32>,
    #[serde(
        rename = "styleNumber",
        default,
        deserialize_with = "optional_u32_from_number_or_text"
    )]
    style_number: Option<u32>,
    #[serde(default)]
    size: String,
}

impl PressRecord {
    fn matches(&self, style_number: u32, size: Size) -> bool {
        self.style_number == Some(style_number) && self.size.trim().parse::<Size>().ok() == Some(size)
    }
}

/// HTTP implementation of [`OrderLookup`].
pub struct HttpOrdersClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpOrdersClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OrderLookup for HttpOrdersClient {
    async fn fetch_order(&self, order_id: u32) -> Result<OrderRecord, OrderError> {
        let url = format!("{}/api/v1/orders/{:05}", self.base_url, order_id);
        debug!("Fetching order {} from {}", order_id, url);
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(OrderError::NotFound(order_id));
        }
        let payload: OrderPayload = response.error_for_status()?.json().await?;
        let size = payload
            .size
            .parse::<Size>()
            .map_err(|_| OrderError::UnknownSize {
                order_id,
                size: payload.size.clone(),
            })?;
        Ok(OrderRecord {
            order_id,
            style_number: payload.style_number,
            size,
            parent_style_number: payload.parent_style_number,
        })
    }

    async fn ship_matching(&self, style_number: u32, size: Size) -> Result<Option<u32>, OrderError> {
        let url = format!("{}/api/v1/press-table/get-records", self.base_url);
        let page: PressTablePage = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(order_id) = page
            .data
            .iter()
            .find(|record| record.matches(style_number, size))
            .and_then(|record| record.order_id)
        else {
            return Ok(None);
        };

        self.http
            .post(format!("{}/api/v1/ship-record/ship", self.base_url))
            .json(&json!({ "order_id": order_id }))
            .send()
            .await?
            .error_for_status()?;
        info!("Order {} moved to ship", order_id);
        Ok(Some(order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_ids_must_have_five_digits() {
        assert_eq!(parse_order_id(" 01234 ").unwrap(), 1234);
        assert!(matches!(parse_order_id("1234"), Err(OrderError::InvalidOrderId(_))));
        assert!(matches!(parse_order_id("123456"), Err(OrderError::InvalidOrderId(_))));
        assert!(matches!(parse_order_id("12a45"), Err(OrderError::InvalidOrderId(_))));
    }

    #[test]
    fn order_payload_accepts_text_style_numbers() {
        let payload: OrderPayload =
            serde_json::from_str(r#"{"style_number": " 10001 ", "size": "M", "parentStyleNumber": 10000}"#)
                .unwrap();
        assert_eq!(payload.style_number, 10001);
        assert_eq!(payload.parent_style_number, Some(10000));
    }

    #[test]
    fn press_record_matches_style_and_size() {
        let page: PressTablePage = serde_json::from_str(
            r#"{"data": [
                {"order_id": 11111, "styleNumber": 10001, "size": "L"},
                {"order_id": "22222", "styleNumber": 10001, "size": "m"}
            ]}"#,
        )
        .unwrap();
        let hit = page.data.iter().find(|r| r.matches(10001, Size::M)).unwrap();
        assert_eq!(hit.order_id, Some(22222));
        assert!(!page.data.iter().any(|r| r.matches(10002, Size::M)));
    }
}
