//! Deserializers for upstream APIs that are loose about JSON types.
//!
//! The catalog and order services sometimes send numeric identifiers as
//! strings (`"10001"`) and text fields as numbers or `null`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Float(f64),
    Text(String),
}

/// Accepts `12345`, `"12345"` or `" 12345 "`.
pub fn u32_from_number_or_text<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => u32::try_from(n).map_err(serde::de::Error::custom),
        NumberOrText::Float(f) if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => {
            Ok(f as u32)
        }
        NumberOrText::Float(f) => Err(serde::de::Error::custom(format!(
            "expected an integer, found {f}"
        ))),
        NumberOrText::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Same as [`u32_from_number_or_text`] but `null`, a missing field or an
/// empty string become `None`.
pub fn optional_u32_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => u32::try_from(n).map(Some).map_err(serde::de::Error::custom),
        Some(NumberOrText::Float(f)) if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => {
            Ok(Some(f as u32))
        }
        Some(NumberOrText::Float(f)) => Err(serde::de::Error::custom(format!(
            "expected an integer, found {f}"
        ))),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Text field that may arrive as a number or `null`; `null` becomes `""`.
pub fn string_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        None => String::new(),
        Some(NumberOrText::Number(n)) => n.to_string(),
        Some(NumberOrText::Float(f)) => f.to_string(),
        Some(NumberOrText::Text(s)) => s,
    })
}
