use serde::{Deserialize, Serialize};

/// Physical layout of a printed label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelTemplate {
    /// Large barcode with a single rack/SKU/color line underneath.
    #[default]
    RackBarcode,
    /// Product name, brand, color, size, MRP and SKU above a compact barcode.
    Detailed,
}

impl LabelTemplate {
    /// Prefix of the downloaded file name, e.g. `barcodes_2025-07-26.pdf`.
    pub fn file_prefix(self) -> &'static str {
        match self {
            LabelTemplate::RackBarcode => "barcodes",
            LabelTemplate::Detailed => "labels",
        }
    }
}

/// One row to print, repeated `quantity` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelData {
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rack_space: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub mrp: String,
    #[serde(default)]
    pub custom_text: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

impl LabelData {
    /// A label that only carries the fields the rack barcode template prints.
    pub fn barcode(sku: impl Into<String>, rack_space: impl Into<String>, color: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            name: String::new(),
            rack_space: rack_space.into(),
            color: color.into(),
            brand: String::new(),
            size: String::new(),
            unit: String::new(),
            mrp: String::new(),
            custom_text: String::new(),
            quantity,
        }
    }
}
