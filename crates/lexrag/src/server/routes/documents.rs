//! Indexed document listing, status, and reset

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DocumentSummary, StatusResponse};

/// Response for GET /api/documents
#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total_chunks: usize,
}

/// Response for POST /api/reset
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: String,
    pub index_version: u64,
}

/// GET /api/documents - Parsed documents and their chunk counts
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let snapshot = state.index().snapshot();
    Json(DocumentListResponse {
        documents: snapshot.document_summaries(),
        total_chunks: snapshot.chunk_count(),
    })
}

/// GET /api/status - Readiness and index size
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.status())
}

/// POST /api/reset - Drop every document and the idf table
pub async fn reset(State(state): State<AppState>) -> Result<Json<ResetResponse>> {
    // Waits on the index writer lock, which a rebuild may hold
    let index = state.index().clone();
    let index_version = tokio::task::spawn_blocking(move || {
        index.reset();
        index.snapshot().version
    })
    .await
    .map_err(|e| Error::internal(format!("Reset task failed: {}", e)))?;

    state.job_queue().tracker().clear_finished();
    tracing::info!("All documents cleared");

    Ok(Json(ResetResponse {
        message: "All documents cleared".to_string(),
        index_version,
    }))
}
