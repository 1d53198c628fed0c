//! Page accumulation and PDF output.
//!
//! The pipeline draws into a [`LabelDocument`]; the PDF implementation only
//! records which image goes on which page. `write_pdf` then emits one image
//! XObject per distinct label and lets every page that shows it point at the
//! same object, so repeated labels cost a few bytes each.

use crate::labels::raster::LabelImage;
use crate::labels::{RenderError, LABEL_HEIGHT_MM, LABEL_WIDTH_MM};
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// A document that starts with one empty page already open.
pub trait LabelDocument {
    /// Opens a new page after the current one.
    fn add_page(&mut self) -> Result<(), RenderError>;

    /// Draws `image` over the full bounds of the current page.
    fn draw_full_page(&mut self, image: Arc<LabelImage>) -> Result<(), RenderError>;
}

#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub title: String,
}

#[derive(Debug)]
pub struct PdfLabelDocument {
    pages: Vec<Option<Arc<LabelImage>>>,
}

impl Default for PdfLabelDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Objects shared by every page that shows the same image.
struct SharedImage {
    name: String,
    xobject: ObjectId,
    content: ObjectId,
}

impl PdfLabelDocument {
    pub fn new() -> Self {
        Self { pages: vec![None] }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Option<Arc<LabelImage>>] {
        &self.pages
    }

    /// Serializes the pages to `path`.
    pub fn write_pdf(&self, settings: &PdfSettings, path: &Path) -> Result<(), RenderError> {
        let mut doc = self.build(settings)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        doc.save(path).map_err(|e| RenderError::Pdf(e.to_string()))?;
        debug!("Wrote {} pages to {}", self.pages.len(), path.display());
        Ok(())
    }

    fn build(&self, settings: &PdfSettings) -> Result<Document, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            (LABEL_WIDTH_MM * POINTS_PER_MM).into(),
            (LABEL_HEIGHT_MM * POINTS_PER_MM).into(),
        ];

        let mut shared: HashMap<*const LabelImage, SharedImage> = HashMap::new();
        let mut blank_content: Option<ObjectId> = None;
        let mut kids = Vec::with_capacity(self.pages.len());

        for page in &self.pages {
            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
            };
            match page {
                Some(image) => {
                    let next_name = format!("Im{}", shared.len() + 1);
                    let entry = match shared.entry(Arc::as_ptr(image)) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => entry.insert(add_image(&mut doc, image, next_name)?),
                    };
                    page_dict.set("Contents", entry.content);
                    page_dict.set(
                        "Resources",
                        dictionary! {
                            "XObject" => dictionary! { entry.name.as_str() => entry.xobject },
                        },
                    );
                }
                None => {
                    let content = *blank_content
                        .get_or_insert_with(|| doc.add_object(Stream::new(dictionary! {}, Vec::new())));
                    page_dict.set("Contents", content);
                    page_dict.set("Resources", Dictionary::new());
                }
            }
            kids.push(Object::from(doc.add_object(page_dict)));
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(settings.title.as_str()),
            "Producer" => Object::string_literal("label_backend"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        debug!(
            "Built PDF with {} pages and {} distinct images",
            page_count,
            shared.len()
        );
        Ok(doc)
    }
}

/// Adds the image XObject and the content stream that paints it over the page.
fn add_image(doc: &mut Document, image: &LabelImage, name: String) -> Result<SharedImage, RenderError> {
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_rgb().to_vec(),
    );
    stream.compress().map_err(|e| RenderError::Pdf(e.to_string()))?;
    let xobject = doc.add_object(stream);

    let width = LABEL_WIDTH_MM * POINTS_PER_MM;
    let height = LABEL_HEIGHT_MM * POINTS_PER_MM;
    let operations = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![width.into(), 0.into(), 0.into(), height.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = operations
        .encode()
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let content = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(SharedImage {
        name,
        xobject,
        content,
    })
}

impl LabelDocument for PdfLabelDocument {
    fn add_page(&mut self) -> Result<(), RenderError> {
        self.pages.push(None);
        Ok(())
    }

    fn draw_full_page(&mut self, image: Arc<LabelImage>) -> Result<(), RenderError> {
        if let Some(current) = self.pages.last_mut() {
            *current = Some(image);
        }
        Ok(())
    }
}
