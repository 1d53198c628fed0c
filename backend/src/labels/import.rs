//! CSV uploads for the two label templates.

use common::model::label::{LabelData, LabelTemplate};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use thiserror::Error;

const BARCODE_COLUMNS: usize = 4;
const LABEL_HEADER_COLUMNS: usize = 10;
const LABEL_ROW_COLUMNS: usize = 9;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV format seems invalid. Please check your columns.")]
    InvalidHeader,
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),
}

/// Parses an upload for `template`.
pub fn parse_csv(template: LabelTemplate, text: &str) -> Result<Vec<LabelData>, ImportError> {
    match template {
        LabelTemplate::RackBarcode => parse_barcode_csv(text),
        LabelTemplate::Detailed => parse_label_csv(text),
    }
}

/// `sku,rack_space,color,quantity` with a header line.
pub fn parse_barcode_csv(text: &str) -> Result<Vec<LabelData>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut labels = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < BARCODE_COLUMNS {
            continue;
        }
        let sku = field(&record, 0);
        if sku.is_empty() {
            continue;
        }
        labels.push(LabelData::barcode(
            sku,
            field(&record, 1),
            field(&record, 2),
            parse_quantity(field(&record, 3)),
        ));
    }
    info!("Imported {} barcode rows", labels.len());
    Ok(labels)
}

/// `label_type,sku,name,brand,color,size,unit,mrp,quantity,custom_text`,
/// tab separated when the upload contains a tab.
pub fn parse_label_csv(text: &str) -> Result<Vec<LabelData>, ImportError> {
    let delimiter = if text.contains('\t') { b'\t' } else { b',' };
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.trim().as_bytes());

    let header_len = reader.headers()?.len();
    if header_len < LABEL_HEADER_COLUMNS {
        warn!("Label CSV header has {} columns", header_len);
        return Err(ImportError::InvalidHeader);
    }

    let mut labels = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < LABEL_ROW_COLUMNS {
            continue;
        }
        let sku = field(&record, 1);
        if sku.is_empty() {
            continue;
        }
        labels.push(LabelData {
            sku: sku.to_string(),
            name: field(&record, 2).to_string(),
            rack_space: String::new(),
            color: field(&record, 4).to_string(),
            brand: field(&record, 3).to_string(),
            size: field(&record, 5).to_string(),
            unit: field(&record, 6).to_string(),
            mrp: field(&record, 7).to_string(),
            custom_text: field(&record, 9).to_string(),
            quantity: parse_quantity(field(&record, 8)),
        });
    }
    info!("Imported {} label rows", labels.len());
    Ok(labels)
}

fn field<'r>(record: &'r StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or_default()
}

/// Leading digits of `raw`; anything unusable (including 0) means one copy.
pub fn parse_quantity(raw: &str) -> u32 {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => 1,
        Ok(n) => n,
    }
}
