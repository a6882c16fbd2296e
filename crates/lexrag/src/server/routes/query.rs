//! Question answering endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{Citation, QueryRequest, QueryResponse};

/// POST /api/query - Answer a question from the indexed documents
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    let question = request.question.trim();
    if question.is_empty() {
        return Err(Error::BadRequest("Question must not be empty".to_string()));
    }

    tracing::info!("Query: \"{}\"", question);

    // Hold one snapshot for the whole request
    let snapshot = state.index().snapshot();
    let results = state.retriever().retrieve(question, &snapshot);

    let citations: Vec<Citation> = results
        .iter()
        .map(|r| Citation::from_scored(r, request.include_chunks))
        .collect();

    let answer = state.orchestrator().answer(&results, question).await;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Answered in {}ms ({:?}, {} chunk(s))",
        processing_time_ms,
        answer.status,
        results.len()
    );

    Ok(Json(QueryResponse {
        answer: answer.text,
        status: answer.status,
        sources: answer.sources,
        citations,
        chunks_retrieved: results.len(),
        index_version: snapshot.version,
        processing_time_ms,
    }))
}
