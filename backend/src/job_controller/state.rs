//! Shared state of background export jobs.
//!
//! - `JobsState`: cloneable handle injected as `web::Data`. It holds the
//!   status of every job and the cancel token and output path of each export.
//! - `JobUpdate`: a status change sent by a running job.
//! - `start_job_updater`: the single task that applies `JobUpdate`s to the map.
//! - `start_export_sweeper`: drops finished exports and their files once they
//!   are older than the configured TTL.

use common::jobs::JobStatus;
use log::{info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use std::{collections::HashMap, fs, io, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Capacity of the update channel.
pub const UPDATE_CHANNEL_SIZE: usize = 100;

#[derive(Clone)]
pub struct JobsState {
    /// Job id to its latest status. Written only by `start_job_updater`
    /// after registration, read by the status endpoint.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Cancel token and output location of each export job.
    pub exports: Arc<RwLock<HashMap<String, ExportHandle>>>,

    /// Running jobs push their progress here.
    pub tx: mpsc::Sender<JobUpdate>,
}

/// What the cancel and download endpoints need to know about an export.
#[derive(Debug, Clone)]
pub struct ExportHandle {
    pub cancel: CancellationToken,
    /// Where the PDF is written on disk.
    pub output: PathBuf,
    /// Name offered to the browser, e.g. `barcodes_2025-07-26.pdf`.
    pub file_name: String,
    pub created: Instant,
}

impl ExportHandle {
    pub fn new(output: PathBuf, file_name: impl Into<String>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            output,
            file_name: file_name.into(),
            created: Instant::now(),
        }
    }
}

fn is_final(status: &JobStatus) -> bool {
    matches!(
        status,
        JobStatus::Completed(_) | JobStatus::Failed(_) | JobStatus::Cancelled
    )
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobUpdate {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
        }
    }
}

impl JobsState {
    /// Creates the state and the receiver to hand to `start_job_updater`.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_SIZE);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            exports: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers an export as `Pending`.
    pub async fn register_export(&self, job_id: &str, handle: ExportHandle) {
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
        self.exports.write().await.insert(job_id.to_string(), handle);
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    pub async fn export(&self, job_id: &str) -> Option<ExportHandle> {
        self.exports.read().await.get(job_id).cloned()
    }

    /// Forgets finished exports older than `ttl` and deletes their PDFs.
    /// Jobs still pending or in progress are kept. Returns how many were removed.
    pub async fn sweep_expired(&self, ttl: Duration) -> usize {
        let mut jobs = self.jobs.write().await;
        let mut exports = self.exports.write().await;

        let expired: Vec<String> = exports
            .iter()
            .filter(|(id, handle)| {
                handle.created.elapsed() >= ttl && jobs.get(*id).is_none_or(is_final)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(handle) = exports.remove(id) {
                match fs::remove_file(&handle.output) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => warn!("Could not remove export {}: {}", handle.output.display(), e),
                }
            }
            jobs.remove(id);
        }
        expired.len()
    }
}

/// Applies job updates until every sender is dropped.
///
/// A job that already finished keeps its final status: late progress
/// messages do not overwrite `Completed`, `Failed` or `Cancelled`.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if !jobs.get(&update.job_id).is_some_and(is_final) {
            jobs.insert(update.job_id, update.status);
        }
    }
}

/// Runs `sweep_expired` every `period` for the lifetime of the server.
pub async fn start_export_sweeper(state: JobsState, ttl: Duration, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let removed = state.sweep_expired(ttl).await;
        if removed > 0 {
            info!("Removed {} expired exports", removed);
        }
    }
}
