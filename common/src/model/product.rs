use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rack placeholder stored on a line item when no valid rack could be resolved.
pub const RACK_NOT_FOUND: &str = "Not found";

/// Garment sizes offered by the entry form, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "XXS")]
    Xxs,
    #[serde(rename = "XS")]
    Xs,
    #[serde(rename = "S")]
    S,
    #[serde(rename = "M")]
    M,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "XL")]
    Xl,
    #[serde(rename = "2XL")]
    Xxl,
    #[serde(rename = "3XL")]
    Xl3,
    #[serde(rename = "4XL")]
    Xl4,
    #[serde(rename = "5XL")]
    Xl5,
}

impl Size {
    pub const ALL: [Size; 10] = [
        Size::Xxs,
        Size::Xs,
        Size::S,
        Size::M,
        Size::L,
        Size::Xl,
        Size::Xxl,
        Size::Xl3,
        Size::Xl4,
        Size::Xl5,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Size::Xxs => "XXS",
            Size::Xs => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::Xl => "XL",
            Size::Xxl => "2XL",
            Size::Xl3 => "3XL",
            Size::Xl4 => "4XL",
            Size::Xl5 => "5XL",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSize(pub String);

impl fmt::Display for UnknownSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown size '{}'", self.0)
    }
}

impl std::error::Error for UnknownSize {}

impl FromStr for Size {
    type Err = UnknownSize;

    /// Case-insensitive; `XXL` is accepted as an alias of `2XL`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        if wanted == "XXL" {
            return Ok(Size::Xxl);
        }
        Size::ALL
            .into_iter()
            .find(|size| size.as_str() == wanted)
            .ok_or_else(|| UnknownSize(s.to_string()))
    }
}

/// One accumulated scan or manual entry in the operator's label list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub style_number: u32,
    pub size: Size,
    pub quantity: u32,
    /// A cleaned rack value or [`RACK_NOT_FOUND`].
    pub rack_space: String,
    pub date_added: DateTime<Utc>,
    /// Set when the entry came from an order scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_style_number: Option<u32>,
}

impl LineItem {
    /// Style used when grouping children under a parent style.
    pub fn parent_or_self(&self) -> u32 {
        self.parent_style_number.unwrap_or(self.style_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_form_labels() {
        assert_eq!("2XL".parse::<Size>().unwrap(), Size::Xxl);
        assert_eq!(" m ".parse::<Size>().unwrap(), Size::M);
        assert_eq!("xxl".parse::<Size>().unwrap(), Size::Xxl);
        assert!("XXXL".parse::<Size>().is_err());
    }

    #[test]
    fn size_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Size::Xl5).unwrap(), "\"5XL\"");
        let size: Size = serde_json::from_str("\"XXS\"").unwrap();
        assert_eq!(size, Size::Xxs);
    }

    #[test]
    fn line_item_omits_missing_order_fields() {
        let item = LineItem {
            style_number: 10001,
            size: Size::M,
            quantity: 2,
            rack_space: "A-12".into(),
            date_added: DateTime::parse_from_rfc3339("2025-07-26T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            order_id: None,
            parent_style_number: None,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("order_id"));
        let back: LineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.parent_or_self(), 10001);
    }
}
