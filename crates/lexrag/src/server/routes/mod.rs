//! API routes for the Q&A server

pub mod documents;
pub mod ingest;
pub mod jobs;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;
use crate::types::FileType;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Uploads get the larger body limit
        .route(
            "/ingest",
            post(ingest::ingest_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/:id", get(jobs::get_job_progress))
        .route("/query", post(query::query))
        .route("/documents", get(documents::list_documents))
        .route("/status", get(documents::status))
        .route("/reset", post(documents::reset))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    let formats: Vec<serde_json::Value> = FileType::ALL
        .iter()
        .map(|t| serde_json::json!({ "name": t.display_name(), "mime_type": t.mime_type() }))
        .collect();

    axum::Json(serde_json::json!({
        "name": "lexrag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document Q&A with TF-IDF retrieval and grounded answers",
        "supported_formats": formats,
        "endpoints": {
            "POST /api/ingest": "Upload documents as one batch (multipart)",
            "GET /api/jobs": "List batches",
            "GET /api/jobs/:id": "Batch progress and per-file outcomes",
            "POST /api/query": "Ask a question",
            "GET /api/documents": "List parsed documents",
            "GET /api/status": "Readiness and index size",
            "POST /api/reset": "Clear all documents"
        }
    }))
}
