use crate::model::label::{LabelData, LabelTemplate};
use crate::model::product::Size;
use serde::{Deserialize, Serialize};

/// Manual entry from the product form; also used to edit an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddProductRequest {
    pub style_number: u32,
    pub size: Size,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Order id read by the scanner; the order service fills in style and size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOrderRequest {
    pub order_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Labels to preview or export with a given template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderLabelsRequest {
    #[serde(default)]
    pub template: LabelTemplate,
    pub labels: Vec<LabelData>,
}

/// Export of the persisted product list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportProductsRequest {
    #[serde(default)]
    pub template: LabelTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartJobResponse {
    pub job_id: String,
}

fn default_quantity() -> u32 {
    1
}
