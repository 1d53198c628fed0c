use crate::model::lenient::{string_from_any, u32_from_number_or_text};
use serde::{Deserialize, Serialize};

/// One product of the remote catalog, keyed by `style_code`.
///
/// `rack_space` is kept exactly as the catalog sends it: it may be quoted
/// (`"'A-12'"`), padded, the placeholder `DEFAULT`, or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(deserialize_with = "u32_from_number_or_text")]
    pub style_code: u32,
    #[serde(default, deserialize_with = "string_from_any")]
    pub rack_space: String,
    #[serde(default, deserialize_with = "string_from_any")]
    pub style_id: String,
    #[serde(
        default,
        alias = "styleprimarycolor",
        alias = "style_primary_color",
        deserialize_with = "string_from_any"
    )]
    pub primary_color: String,
}

/// Outcome of a successful rack-space lookup.
///
/// `resolved_style_number` differs from the queried number when the rack was
/// borrowed from a neighbouring style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackResolution {
    pub rack_space: String,
    pub resolved_style_number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_loose_catalog_payload() {
        let json = r#"[
            {"style_code": 10001, "rack_space": "DEFAULT", "style_id": 998877, "styleprimarycolor": "Red"},
            {"style_code": "10004", "rack_space": null},
            {"style_code": 10005, "rack_space": "'A-12'", "style_id": "abc", "primary_color": "Blue", "extra": true}
        ]"#;
        let records: Vec<CatalogRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].style_id, "998877");
        assert_eq!(records[0].primary_color, "Red");
        assert_eq!(records[1].style_code, 10004);
        assert_eq!(records[1].rack_space, "");
        assert_eq!(records[2].primary_color, "Blue");
    }
}
