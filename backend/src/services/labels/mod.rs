//! Label import, preview and PDF export.
//!
//! Exports run as background jobs, like every other long task in the
//! server: the start endpoints return a `job_id` right away and the client
//! polls `/status/{job_id}`, may `/cancel/{job_id}`, and fetches the PDF
//! from `/download/{job_id}` once the job reports `Completed`.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod export;
mod import;
mod jobs;
mod preview;

const API_PATH: &str = "/api/labels";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/import/{kind}", post().to(import::process))
        .route("/preview", post().to(preview::process))
        .route("/export", post().to(export::labels))
        .route("/export/products", post().to(export::products))
        .route("/status/{job_id}", get().to(jobs::status))
        .route("/cancel/{job_id}", post().to(jobs::cancel))
        .route("/download/{job_id}", get().to(jobs::download))
}
