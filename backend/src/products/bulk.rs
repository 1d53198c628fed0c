//! Bulk barcode sheet built from the product list.
//!
//! Entries are grouped by parent style (ascending) and then by size (first
//! appearance). A size with several children collapses into one combo row
//! labelled with the parent style; a lone child keeps its own order id and a
//! `style-size-parent` barcode.

use crate::catalog::CatalogSnapshot;
use common::model::label::LabelData;
use common::model::product::{LineItem, Size};
use std::collections::BTreeMap;

pub const BULK_HEADER: [&str; 5] = ["OrderId", "Barcode", "Title", "Label Type", "Qty"];

const NO_ORDER: &str = "-";
const NO_COLOR: &str = "NA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRow {
    pub order_id: String,
    pub barcode: String,
    pub rack_space: String,
    pub color: String,
    pub quantity: u32,
}

pub fn group_rows(items: &[LineItem], catalog: &CatalogSnapshot) -> Vec<BulkRow> {
    let mut by_parent: BTreeMap<u32, Vec<(Size, Vec<&LineItem>)>> = BTreeMap::new();
    for item in items {
        let sizes = by_parent.entry(item.parent_or_self()).or_default();
        match sizes.iter_mut().find(|(size, _)| *size == item.size) {
            Some((_, group)) => group.push(item),
            None => sizes.push((item.size, vec![item])),
        }
    }

    let mut rows = Vec::new();
    for (parent, sizes) in by_parent {
        for (size, group) in sizes {
            let first = group[0];
            let color = catalog
                .color_of(first.style_number)
                .unwrap_or(NO_COLOR)
                .to_string();
            let row = if group.len() > 1 {
                BulkRow {
                    order_id: NO_ORDER.to_string(),
                    barcode: format!("{parent}-{size}"),
                    rack_space: first.rack_space.clone(),
                    color,
                    quantity: group.iter().map(|item| item.quantity).sum(),
                }
            } else {
                BulkRow {
                    order_id: first
                        .order_id
                        .map(|id| format!("{id:05}"))
                        .unwrap_or_else(|| NO_ORDER.to_string()),
                    barcode: format!("{}-{}-{}", first.style_number, size, parent),
                    rack_space: first.rack_space.clone(),
                    color,
                    quantity: first.quantity,
                }
            };
            rows.push(row);
        }
    }
    rows
}

/// Serializes rows as the `BulkGenerateBarcodeLabels.csv` sheet.
pub fn write_bulk_csv(rows: &[BulkRow]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(BULK_HEADER)?;
    for row in rows {
        writer.write_record([
            row.order_id.as_str(),
            row.barcode.as_str(),
            row.rack_space.as_str(),
            row.color.as_str(),
            &row.quantity.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Rows ready for the rack barcode template.
pub fn labels_from_rows(rows: &[BulkRow]) -> Vec<LabelData> {
    rows.iter()
        .map(|row| {
            LabelData::barcode(
                row.barcode.clone(),
                row.rack_space.clone(),
                row.color.clone(),
                row.quantity.max(1),
            )
        })
        .collect()
}
