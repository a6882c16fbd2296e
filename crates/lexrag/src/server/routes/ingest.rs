//! Document upload endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{Batch, UploadedFile};
use crate::server::state::AppState;

/// Response from an upload
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub batch_id: Uuid,
    pub files_queued: usize,
    pub message: String,
}

/// POST /api/ingest - Queue uploaded files as one batch
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => {
                tracing::debug!("Ignoring non-file field {:?}", field.name());
                continue;
            }
        };
        let content_type = field.content_type().map(str::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read '{}': {}", filename, e)))?;

        tracing::info!(
            "Received file: {} ({} bytes, {})",
            filename,
            data.len(),
            content_type.as_deref().unwrap_or("no content type")
        );
        files.push(UploadedFile::new(filename, content_type, data.to_vec()));
    }

    if files.is_empty() {
        return Err(Error::BadRequest("No files provided".to_string()));
    }

    let files_queued = files.len();
    let batch = Batch::new(files, state.index().epoch());
    let batch_id = state.job_queue().submit(batch).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            batch_id,
            files_queued,
            message: format!(
                "Processing {} file(s). Use /api/jobs/{} to check progress.",
                files_queued, batch_id
            ),
        }),
    ))
}
