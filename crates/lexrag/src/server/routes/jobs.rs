//! Batch progress endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::BatchProgress;
use crate::server::state::AppState;

/// Response for GET /api/jobs
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub batches: Vec<BatchProgress>,
    pub batches_in_flight: usize,
    pub files_in_flight: usize,
}

/// GET /api/jobs - List all batches
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    let queue = state.job_queue();
    Json(JobListResponse {
        batches: queue.list(),
        batches_in_flight: queue.batches_in_flight(),
        files_in_flight: queue.files_in_flight(),
    })
}

/// GET /api/jobs/:id - Progress and per-file events of one batch
pub async fn get_job_progress(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchProgress>> {
    state
        .job_queue()
        .get_progress(batch_id)
        .map(Json)
        .ok_or(Error::JobNotFound(batch_id))
}
