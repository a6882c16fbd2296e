//! Application state for the Q&A server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{AnswerOrchestrator, RetryPolicy};
use crate::ingestion::{ExtractorRegistry, TextChunker};
use crate::processing::{JobQueue, ProcessingWorker};
use crate::providers::{GeminiClient, GenerationProvider};
use crate::retrieval::{IndexStore, Retriever};
use crate::types::StatusResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    index: Arc<IndexStore>,
    job_queue: Arc<JobQueue>,
    retriever: Retriever,
    orchestrator: AnswerOrchestrator,
}

impl AppState {
    /// Build state around the Gemini provider.
    ///
    /// Spawns the processing worker, so it must run inside a tokio runtime.
    pub fn new(config: RagConfig) -> Result<Self> {
        let provider: Arc<dyn GenerationProvider> = Arc::new(GeminiClient::new(&config.llm)?);
        tracing::info!("Generation provider: {} ({})", provider.name(), provider.model());

        let orchestrator = AnswerOrchestrator::new(provider, RetryPolicy::from_config(&config.llm));
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    /// Build state around an existing orchestrator
    pub fn with_orchestrator(config: RagConfig, orchestrator: AnswerOrchestrator) -> Self {
        let index = Arc::new(IndexStore::new());
        let (job_queue, receiver) = JobQueue::new(64);
        let job_queue = Arc::new(job_queue);

        let worker = ProcessingWorker::new(
            Arc::new(ExtractorRegistry::with_defaults()),
            TextChunker::from_config(&config.chunking),
            index.clone(),
            job_queue.tracker().clone(),
            config.processing.effective_parallel_files(),
        );
        tokio::spawn(async move {
            worker.run(receiver).await;
        });

        let retriever = Retriever::new(config.retrieval.top_k);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                job_queue,
                retriever,
                orchestrator,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn index(&self) -> &Arc<IndexStore> {
        &self.inner.index
    }

    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }

    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    pub fn orchestrator(&self) -> &AnswerOrchestrator {
        &self.inner.orchestrator
    }

    /// Questions can be answered from indexed content
    pub fn is_ready(&self) -> bool {
        !self.inner.index.snapshot().is_empty()
    }

    pub fn status(&self) -> StatusResponse {
        let snapshot = self.inner.index.snapshot();
        let files_in_flight = self.inner.job_queue.files_in_flight();

        let status_text = if files_in_flight > 0 {
            format!("Processing {} file(s)...", files_in_flight)
        } else if snapshot.is_empty() {
            "No Documents Loaded".to_string()
        } else {
            "Ready to Answer".to_string()
        };

        StatusResponse {
            ready: !snapshot.is_empty(),
            status_text,
            batches_in_flight: self.inner.job_queue.batches_in_flight(),
            documents: snapshot.document_summaries().len(),
            chunks: snapshot.chunk_count(),
            vocabulary: snapshot.vocabulary_size(),
            index_version: snapshot.version,
        }
    }
}
