//! Turns a list of labels into document pages.

use crate::labels::document::LabelDocument;
use crate::labels::raster::{LabelImage, Rasterizer};
use crate::labels::RenderError;
use common::model::label::{LabelData, LabelTemplate};
use log::{debug, error};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_YIELD_EVERY: usize = 20;

/// How often the pipeline hands control back to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YieldPolicy {
    every: Option<NonZeroUsize>,
}

impl Default for YieldPolicy {
    fn default() -> Self {
        Self::every(DEFAULT_YIELD_EVERY)
    }
}

impl YieldPolicy {
    /// Yield after every `pages` emitted pages; `0` never yields.
    pub fn every(pages: usize) -> Self {
        Self {
            every: NonZeroUsize::new(pages),
        }
    }

    pub fn never() -> Self {
        Self { every: None }
    }

    pub fn should_yield(&self, emitted: usize) -> bool {
        match self.every {
            Some(k) => emitted > 0 && emitted % k.get() == 0,
            None => false,
        }
    }
}

/// Identity of a rendered label. Two labels with the same key look identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelKey {
    template: LabelTemplate,
    fields: Vec<String>,
}

impl LabelKey {
    pub fn new(template: LabelTemplate, label: &LabelData) -> Self {
        let mut fields = vec![
            label.sku.clone(),
            label.name.clone(),
            label.rack_space.clone(),
            label.color.clone(),
        ];
        if template == LabelTemplate::Detailed {
            fields.extend([
                label.brand.clone(),
                label.size.clone(),
                label.unit.clone(),
                label.mrp.clone(),
                label.custom_text.clone(),
            ]);
        }
        Self { template, fields }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    pub pages: usize,
    pub rasterized: usize,
}

pub fn total_pages(labels: &[LabelData]) -> usize {
    labels.iter().map(|l| l.quantity as usize).sum()
}

/// Rasterizes each distinct label once and draws it `quantity` times.
///
/// Pages follow input order. The first page of the batch is the document's
/// initial page; every later one is opened with `add_page`. `on_page` is
/// called with `(emitted, total)` after each page.
pub async fn render_labels<R, D, F>(
    labels: &[LabelData],
    template: LabelTemplate,
    rasterizer: &R,
    document: &mut D,
    policy: YieldPolicy,
    cancel: &CancellationToken,
    mut on_page: F,
) -> Result<RenderReport, RenderError>
where
    R: Rasterizer + ?Sized,
    D: LabelDocument + ?Sized,
    F: FnMut(usize, usize),
{
    if labels.is_empty() {
        return Err(RenderError::Empty);
    }

    let total = total_pages(labels);
    if total == 0 {
        return Err(RenderError::Empty);
    }
    let mut cache: HashMap<LabelKey, Arc<LabelImage>> = HashMap::new();
    let mut emitted = 0usize;

    for label in labels {
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        let key = LabelKey::new(template, label);
        let image = match cache.get(&key) {
            Some(image) => Arc::clone(image),
            None => {
                let image = rasterizer.rasterize(template, label).map_err(|e| {
                    error!("Failed to render label '{}': {}", label.sku, e);
                    RenderError::Label {
                        sku: label.sku.clone(),
                        source: Box::new(e),
                    }
                })?;
                let image = Arc::new(image);
                cache.insert(key, Arc::clone(&image));
                image
            }
        };

        for _ in 0..label.quantity {
            if emitted > 0 {
                document.add_page()?;
            }
            document.draw_full_page(Arc::clone(&image))?;
            emitted += 1;
            on_page(emitted, total);

            if policy.should_yield(emitted) {
                tokio::task::yield_now().await;
                if cancel.is_cancelled() {
                    return Err(RenderError::Cancelled);
                }
            }
        }
    }

    debug!(
        "Rendered {} pages from {} labels ({} rasterized)",
        emitted,
        labels.len(),
        cache.len()
    );
    Ok(RenderReport {
        pages: emitted,
        rasterized: cache.len(),
    })
}

/// Rasterizes the first label only.
pub fn render_preview<R>(
    labels: &[LabelData],
    template: LabelTemplate,
    rasterizer: &R,
) -> Result<LabelImage, RenderError>
where
    R: Rasterizer + ?Sized,
{
    let first = labels.first().ok_or(RenderError::Empty)?;
    rasterizer.rasterize(template, first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::barcode::{BarcodeError, Code128};
    use crate::labels::document::tests::image_object_count;
    use crate::labels::document::{PdfLabelDocument, PdfSettings};
    use crate::labels::raster::tests::fixture_fonts;
    use crate::labels::raster::CanvasRasterizer;
    use image::RgbImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRasterizer {
        calls: AtomicUsize,
    }

    impl Rasterizer for CountingRasterizer {
        fn rasterize(&self, _template: LabelTemplate, label: &LabelData) -> Result<LabelImage, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Code128::encode(&label.sku)?;
            Ok(LabelImage::new(RgbImage::new(4, 2)))
        }
    }

    fn label(sku: &str, qty: u32) -> LabelData {
        LabelData::barcode(sku, "R1", "Red", qty)
    }

    #[tokio::test]
    async fn quantities_expand_to_pages_in_order() {
        let rasterizer = CountingRasterizer::default();
        let mut doc = PdfLabelDocument::new();
        let labels = vec![label("A-1", 2), label("B-2", 1)];
        let mut progress = Vec::new();

        let report = render_labels(
            &labels,
            LabelTemplate::RackBarcode,
            &rasterizer,
            &mut doc,
            YieldPolicy::never(),
            &CancellationToken::new(),
            |done, total| progress.push((done, total)),
        )
        .await
        .unwrap();

        assert_eq!(report, RenderReport { pages: 3, rasterized: 2 });
        assert_eq!(doc.page_count(), 3);
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

        let pages: Vec<_> = doc.pages().iter().map(|p| p.clone().unwrap()).collect();
        assert!(Arc::ptr_eq(&pages[0], &pages[1]));
        assert!(!Arc::ptr_eq(&pages[1], &pages[2]));
    }

    #[tokio::test]
    async fn repeated_labels_are_rasterized_once() {
        let rasterizer = CountingRasterizer::default();
        let mut doc = PdfLabelDocument::new();
        let labels = vec![label("A-1", 1), label("B-2", 1), label("A-1", 3)];

        let report = render_labels(
            &labels,
            LabelTemplate::RackBarcode,
            &rasterizer,
            &mut doc,
            YieldPolicy::default(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(report.pages, 5);
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unsupported_character_aborts_the_batch() {
        let rasterizer = CountingRasterizer::default();
        let mut doc = PdfLabelDocument::new();
        let labels = vec![label("A-1", 1), label("Ä-2", 1), label("C-3", 1)];

        let err = render_labels(
            &labels,
            LabelTemplate::RackBarcode,
            &rasterizer,
            &mut doc,
            YieldPolicy::never(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap_err();

        match err {
            RenderError::Label { sku, source } => {
                assert_eq!(sku, "Ä-2");
                assert!(matches!(
                    *source,
                    RenderError::Barcode(BarcodeError::UnsupportedCharacter { .. })
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_rendering() {
        let rasterizer = CountingRasterizer::default();
        let mut doc = PdfLabelDocument::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = render_labels(
            &[label("A-1", 1)],
            LabelTemplate::RackBarcode,
            &rasterizer,
            &mut doc,
            YieldPolicy::never(),
            &cancel,
            |_, _| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RenderError::Cancelled));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_is_observed_at_yield_points() {
        let rasterizer = CountingRasterizer::default();
        let mut doc = PdfLabelDocument::new();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let err = render_labels(
            &[label("A-1", 10)],
            LabelTemplate::RackBarcode,
            &rasterizer,
            &mut doc,
            YieldPolicy::every(4),
            &cancel,
            |done, _| {
                if done == 2 {
                    trigger.cancel();
                }
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RenderError::Cancelled));
        assert_eq!(doc.page_count(), 4);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let rasterizer = CountingRasterizer::default();
        let mut doc = PdfLabelDocument::new();
        let err = render_labels(
            &[],
            LabelTemplate::Detailed,
            &rasterizer,
            &mut doc,
            YieldPolicy::never(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RenderError::Empty));
    }

    #[tokio::test]
    async fn zero_quantity_batch_is_rejected() {
        let rasterizer = CountingRasterizer::default();
        let mut doc = PdfLabelDocument::new();
        let err = render_labels(
            &[label("A-1", 0), label("B-2", 0)],
            LabelTemplate::RackBarcode,
            &rasterizer,
            &mut doc,
            YieldPolicy::never(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RenderError::Empty));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_quantity_rows_are_skipped() {
        let rasterizer = CountingRasterizer::default();
        let mut doc = PdfLabelDocument::new();
        let report = render_labels(
            &[label("A-1", 0), label("B-2", 2)],
            LabelTemplate::RackBarcode,
            &rasterizer,
            &mut doc,
            YieldPolicy::never(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(doc.page_count(), 2);
    }

    #[tokio::test]
    async fn real_fonts_write_one_image_per_distinct_label() {
        let rasterizer = CanvasRasterizer::new(fixture_fonts());
        let mut doc = PdfLabelDocument::new();
        let labels = vec![label("A-1", 2), label("B-2", 1)];

        let report = render_labels(
            &labels,
            LabelTemplate::RackBarcode,
            &rasterizer,
            &mut doc,
            YieldPolicy::default(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap();
        assert_eq!(report, RenderReport { pages: 3, rasterized: 2 });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.pdf");
        doc.write_pdf(&PdfSettings { title: "labels".into() }, &path).unwrap();

        let written = lopdf::Document::load(&path).unwrap();
        assert_eq!(written.get_pages().len(), 3);
        assert_eq!(image_object_count(&written), 2);
    }

    #[tokio::test]
    async fn pdf_size_does_not_grow_with_copies() {
        let rasterizer = CanvasRasterizer::new(fixture_fonts());
        let dir = tempfile::tempdir().unwrap();
        let mut sizes = Vec::new();

        for copies in [1, 30] {
            let mut doc = PdfLabelDocument::new();
            render_labels(
                &[label("A-1", copies)],
                LabelTemplate::Detailed,
                &rasterizer,
                &mut doc,
                YieldPolicy::never(),
                &CancellationToken::new(),
                |_, _| {},
            )
            .await
            .unwrap();
            let path = dir.path().join(format!("copies_{copies}.pdf"));
            doc.write_pdf(&PdfSettings { title: "labels".into() }, &path).unwrap();

            let written = lopdf::Document::load(&path).unwrap();
            assert_eq!(written.get_pages().len(), copies as usize);
            assert_eq!(image_object_count(&written), 1);
            sizes.push(std::fs::metadata(&path).unwrap().len());
        }

        // Each extra copy only adds a page dictionary.
        assert!(sizes[1] < sizes[0] + 30 * 1024, "sizes: {sizes:?}");
    }

    #[test]
    fn yield_policy_counts_emitted_pages() {
        let policy = YieldPolicy::every(20);
        assert!(!policy.should_yield(0));
        assert!(!policy.should_yield(19));
        assert!(policy.should_yield(20));
        assert!(policy.should_yield(40));
        assert!(!YieldPolicy::never().should_yield(20));
        assert_eq!(YieldPolicy::every(0), YieldPolicy::never());
    }

    #[test]
    fn detail_fields_only_matter_for_detailed_template() {
        let mut a = label("A-1", 1);
        let mut b = a.clone();
        b.brand = "Acme".into();
        assert_eq!(
            LabelKey::new(LabelTemplate::RackBarcode, &a),
            LabelKey::new(LabelTemplate::RackBarcode, &b)
        );
        assert_ne!(
            LabelKey::new(LabelTemplate::Detailed, &a),
            LabelKey::new(LabelTemplate::Detailed, &b)
        );
        a.quantity = 7;
        assert_eq!(
            LabelKey::new(LabelTemplate::Detailed, &a),
            LabelKey::new(LabelTemplate::Detailed, &label("A-1", 1))
        );
    }

    #[test]
    fn preview_uses_first_label() {
        let rasterizer = CountingRasterizer::default();
        let labels = vec![label("A-1", 5), label("B-2", 1)];
        render_preview(&labels, LabelTemplate::RackBarcode, &rasterizer).unwrap();
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            render_preview(&[], LabelTemplate::RackBarcode, &rasterizer),
            Err(RenderError::Empty)
        ));
    }
}
