//! Label rendering: barcode encoding, rasterization, pagination and CSV import.

pub mod barcode;
pub mod document;
pub mod import;
pub mod pipeline;
pub mod raster;

use barcode::BarcodeError;
use thiserror::Error;

/// Label size in millimetres (landscape).
pub const LABEL_WIDTH_MM: f64 = 100.0;
pub const LABEL_HEIGHT_MM: f64 = 50.0;

/// Rasterization resolution; also the DPI the images are embedded at.
pub const LABEL_DPI: f64 = 300.0;

/// 100 x 50 mm at 300 dpi, rounded down so the image never overflows the page.
pub const LABEL_WIDTH_PX: u32 = 1181;
pub const LABEL_HEIGHT_PX: u32 = 590;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to render")]
    Empty,
    #[error("label for SKU '{sku}' failed: {source}")]
    Label {
        sku: String,
        #[source]
        source: Box<RenderError>,
    },
    #[error(transparent)]
    Barcode(#[from] BarcodeError),
    #[error("font error: {0}")]
    Font(String),
    #[error("PNG encoding failed: {0}")]
    Png(String),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rendering cancelled")]
    Cancelled,
}
