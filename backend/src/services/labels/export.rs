//! # Label Export Jobs
//!
//! `POST /api/labels/export` renders the labels in the request body;
//! `POST /api/labels/export/products` renders the persisted product list
//! through the bulk grouping. Both answer `{ "job_id": ... }` immediately.
//!
//! ## Workflow
//!
//! 1. `schedule_export_job` registers the job as `Pending` together with its
//!    cancel token and output path, then spawns the worker task.
//! 2. The worker runs the page pipeline on the runtime. It yields every few
//!    pages and reports progress as `InProgress(percent)`.
//! 3. The finished page plan is written to disk with `spawn_blocking`, since
//!    PDF assembly and image encoding are CPU bound.
//! 4. The job ends as `Completed`, `Cancelled`, or `Failed("PDF export
//!    failed.")`; the detailed cause of a failure only goes to the log.

use crate::catalog::CatalogSnapshot;
use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::job_controller::state::{ExportHandle, JobUpdate, JobsState};
use crate::labels::document::{PdfLabelDocument, PdfSettings};
use crate::labels::pipeline::{render_labels, total_pages, RenderReport, YieldPolicy};
use crate::labels::raster::Rasterizer;
use crate::labels::RenderError;
use crate::products::bulk::{group_rows, labels_from_rows};
use crate::products::ProductList;
use actix_web::{web, HttpResponse};
use chrono::Local;
use common::jobs::JobStatus;
use common::model::label::{LabelData, LabelTemplate};
use common::requests::{ExportProductsRequest, RenderLabelsRequest, StartJobResponse};
use log::{error, info, warn};
use std::fs;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

const EXPORT_FAILED: &str = "PDF export failed.";
const NOTHING_TO_EXPORT: &str = "No products to export!";

pub(crate) async fn labels(
    payload: web::Json<RenderLabelsRequest>,
    jobs: web::Data<JobsState>,
    rasterizer: web::Data<dyn Rasterizer>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ServiceError> {
    let req = payload.into_inner();
    let job_id = schedule_export_job(
        jobs.get_ref().clone(),
        rasterizer.into_inner(),
        config.into_inner(),
        req.template,
        req.labels,
    )
    .await?;
    Ok(HttpResponse::Accepted().json(StartJobResponse { job_id }))
}

pub(crate) async fn products(
    payload: Option<web::Json<ExportProductsRequest>>,
    jobs: web::Data<JobsState>,
    products: web::Data<ProductList>,
    catalog: web::Data<CatalogSnapshot>,
    rasterizer: web::Data<dyn Rasterizer>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ServiceError> {
    let template = payload.map(|p| p.into_inner().template).unwrap_or_default();
    let items = products.snapshot().await;
    let labels = labels_from_rows(&group_rows(&items, &catalog));
    let job_id = schedule_export_job(
        jobs.get_ref().clone(),
        rasterizer.into_inner(),
        config.into_inner(),
        template,
        labels,
    )
    .await?;
    Ok(HttpResponse::Accepted().json(StartJobResponse { job_id }))
}

/// Registers the job and spawns its worker; returns the new job id.
pub(crate) async fn schedule_export_job(
    jobs: JobsState,
    rasterizer: Arc<dyn Rasterizer>,
    config: Arc<AppConfig>,
    template: LabelTemplate,
    labels: Vec<LabelData>,
) -> Result<String, ServiceError> {
    if total_pages(&labels) == 0 {
        return Err(ServiceError::BadRequest(NOTHING_TO_EXPORT.into()));
    }

    let job_id = Uuid::new_v4().to_string();
    let date = Local::now().format("%Y-%m-%d");
    let prefix = template.file_prefix();
    let handle = ExportHandle::new(
        config
            .output_dir
            .join(format!("{}_{}_{}.pdf", prefix, date, job_id)),
        format!("{}_{}.pdf", prefix, date),
    );
    jobs.register_export(&job_id, handle.clone()).await;
    info!("Export {} scheduled: {} labels", job_id, labels.len());

    let settings = PdfSettings {
        title: handle.file_name.clone(),
    };
    let policy = YieldPolicy::every(config.yield_every);
    let tx = jobs.tx.clone();
    let job_id_for_task = job_id.clone();

    tokio::spawn(async move {
        let status = match run_export(
            &job_id_for_task,
            tx.clone(),
            rasterizer,
            template,
            labels,
            policy,
            settings,
            &handle,
        )
        .await
        {
            Ok(report) => {
                info!(
                    "Export {} finished: {} pages, {} distinct labels",
                    job_id_for_task, report.pages, report.rasterized
                );
                JobStatus::Completed(handle.file_name.clone())
            }
            Err(RenderError::Cancelled) => {
                info!("Export {} cancelled", job_id_for_task);
                JobStatus::Cancelled
            }
            Err(e) => {
                error!("Export {} failed: {}", job_id_for_task, e);
                if handle.output.exists() {
                    if let Err(e) = fs::remove_file(&handle.output) {
                        warn!("Could not remove partial export {}: {}", handle.output.display(), e);
                    }
                }
                JobStatus::Failed(EXPORT_FAILED.to_string())
            }
        };
        let _ = tx.send(JobUpdate::new(job_id_for_task, status)).await;
    });

    Ok(job_id)
}

#[allow(clippy::too_many_arguments)]
async fn run_export(
    job_id: &str,
    tx: mpsc::Sender<JobUpdate>,
    rasterizer: Arc<dyn Rasterizer>,
    template: LabelTemplate,
    labels: Vec<LabelData>,
    policy: YieldPolicy,
    settings: PdfSettings,
    handle: &ExportHandle,
) -> Result<RenderReport, RenderError> {
    let _ = tx
        .send(JobUpdate::new(job_id, JobStatus::InProgress(0)))
        .await;

    let mut document = PdfLabelDocument::new();
    let mut last_percent = 0;
    let report = render_labels(
        &labels,
        template,
        rasterizer.as_ref(),
        &mut document,
        policy,
        &handle.cancel,
        |emitted, total| {
            // Rendering covers the first 90%; the rest is writing the file.
            let percent = (emitted * 90 / total.max(1)) as u32;
            if percent > last_percent {
                last_percent = percent;
                let _ = tx.try_send(JobUpdate::new(job_id, JobStatus::InProgress(percent)));
            }
        },
    )
    .await?;

    if handle.cancel.is_cancelled() {
        return Err(RenderError::Cancelled);
    }

    let output = handle.output.clone();
    tokio::task::spawn_blocking(move || document.write_pdf(&settings, &output))
        .await
        .map_err(|e| RenderError::Pdf(format!("task join error: {}", e)))??;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_controller::state::start_job_updater;
    use crate::labels::document::tests::image_object_count;
    use crate::labels::raster::LabelImage;
    use image::RgbImage;
    use std::time::Duration;

    struct BlankRasterizer;

    impl Rasterizer for BlankRasterizer {
        fn rasterize(&self, _template: LabelTemplate, label: &LabelData) -> Result<LabelImage, RenderError> {
            if label.sku.is_empty() {
                return Err(RenderError::Font("no glyphs".into()));
            }
            Ok(LabelImage::new(RgbImage::new(8, 4)))
        }
    }

    fn config(dir: &std::path::Path) -> Arc<AppConfig> {
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.output_dir = dir.to_path_buf();
        Arc::new(config)
    }

    async fn wait_for_final(jobs: &JobsState, job_id: &str) -> JobStatus {
        for _ in 0..500 {
            match jobs.status(job_id).await {
                Some(JobStatus::Pending) | Some(JobStatus::InProgress(_)) | None => {
                    tokio::time::sleep(Duration::from_millis(10)).await
                }
                Some(status) => return status,
            }
        }
        panic!("job {} did not finish", job_id);
    }

    #[tokio::test]
    async fn empty_export_is_rejected_without_a_job() {
        let (jobs, _rx) = JobsState::new();
        let dir = tempfile::tempdir().unwrap();
        let err = schedule_export_job(
            jobs.clone(),
            Arc::new(BlankRasterizer),
            config(dir.path()),
            LabelTemplate::RackBarcode,
            Vec::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "No products to export!");
        assert!(jobs.jobs.read().await.is_empty());
    }

    #[tokio::test]
    async fn zero_quantity_export_is_rejected_without_a_job() {
        let (jobs, _rx) = JobsState::new();
        let dir = tempfile::tempdir().unwrap();
        let err = schedule_export_job(
            jobs.clone(),
            Arc::new(BlankRasterizer),
            config(dir.path()),
            LabelTemplate::RackBarcode,
            vec![LabelData::barcode("A-1", "R1", "Red", 0)],
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "No products to export!");
        assert!(jobs.jobs.read().await.is_empty());
    }

    #[tokio::test]
    async fn failing_label_marks_job_failed_with_generic_message() {
        let (jobs, rx) = JobsState::new();
        tokio::spawn(start_job_updater(jobs.clone(), rx));
        let dir = tempfile::tempdir().unwrap();

        let labels = vec![
            LabelData::barcode("A-1", "R1", "Red", 1),
            LabelData::barcode("", "R2", "Blue", 1),
        ];
        let job_id = schedule_export_job(
            jobs.clone(),
            Arc::new(BlankRasterizer),
            config(dir.path()),
            LabelTemplate::RackBarcode,
            labels,
        )
        .await
        .unwrap();

        let status = wait_for_final(&jobs, &job_id).await;
        assert_eq!(status, JobStatus::Failed("PDF export failed.".into()));
        let handle = jobs.export(&job_id).await.unwrap();
        assert!(!handle.output.exists());
    }

    #[tokio::test]
    async fn completed_export_writes_one_image_per_label() {
        let (jobs, rx) = JobsState::new();
        tokio::spawn(start_job_updater(jobs.clone(), rx));
        let dir = tempfile::tempdir().unwrap();

        let labels = vec![
            LabelData::barcode("A-1", "R1", "Red", 2),
            LabelData::barcode("B-2", "R2", "Blue", 1),
        ];
        let job_id = schedule_export_job(
            jobs.clone(),
            Arc::new(BlankRasterizer),
            config(dir.path()),
            LabelTemplate::RackBarcode,
            labels,
        )
        .await
        .unwrap();

        let handle = jobs.export(&job_id).await.unwrap();
        assert_eq!(
            wait_for_final(&jobs, &job_id).await,
            JobStatus::Completed(handle.file_name.clone())
        );
        let written = lopdf::Document::load(&handle.output).unwrap();
        assert_eq!(written.get_pages().len(), 3);
        assert_eq!(image_object_count(&written), 2);
    }

    #[tokio::test]
    async fn cancelled_export_reports_cancelled() {
        let (jobs, rx) = JobsState::new();
        tokio::spawn(start_job_updater(jobs.clone(), rx));
        let dir = tempfile::tempdir().unwrap();

        let job_id = schedule_export_job(
            jobs.clone(),
            Arc::new(BlankRasterizer),
            config(dir.path()),
            LabelTemplate::RackBarcode,
            vec![LabelData::barcode("A-1", "R1", "Red", 500)],
        )
        .await
        .unwrap();
        // The worker has not run yet on the current-thread runtime.
        jobs.export(&job_id).await.unwrap().cancel.cancel();

        assert_eq!(wait_for_final(&jobs, &job_id).await, JobStatus::Cancelled);
    }
}
