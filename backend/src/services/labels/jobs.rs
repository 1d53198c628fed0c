use crate::error::ServiceError;
use crate::job_controller::state::JobsState;
use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use log::info;

pub(crate) async fn status(job_id: web::Path<String>, jobs: web::Data<JobsState>) -> impl Responder {
    match jobs.status(&job_id).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().body("Job ID not found"),
    }
}

/// Asks a running export to stop at its next checkpoint.
pub(crate) async fn cancel(
    job_id: web::Path<String>,
    jobs: web::Data<JobsState>,
) -> Result<HttpResponse, ServiceError> {
    let handle = jobs
        .export(&job_id)
        .await
        .ok_or_else(|| ServiceError::NotFound("Job ID not found".into()))?;
    handle.cancel.cancel();
    info!("Cancel requested for export {}", job_id.as_str());
    Ok(HttpResponse::Accepted().json(serde_json::json!({ "job_id": job_id.into_inner() })))
}

/// Serves a finished export as `barcodes_YYYY-MM-DD.pdf` or `labels_YYYY-MM-DD.pdf`.
pub(crate) async fn download(
    job_id: web::Path<String>,
    jobs: web::Data<JobsState>,
) -> Result<NamedFile, ServiceError> {
    let not_found = || ServiceError::NotFound("Job ID not found".into());
    let handle = jobs.export(&job_id).await.ok_or_else(not_found)?;
    match jobs.status(&job_id).await.ok_or_else(not_found)? {
        JobStatus::Completed(_) => {}
        JobStatus::Failed(message) => return Err(ServiceError::BadRequest(message)),
        _ => return Err(ServiceError::BadRequest("The export is not finished yet.".into())),
    }

    let file = NamedFile::open_async(&handle.output)
        .await
        .map_err(|e| ServiceError::internal("Exported file is missing.", e))?;
    Ok(file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(handle.file_name)],
    }))
}
