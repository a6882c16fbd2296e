//! Parsing pipeline: per-file extraction off the async runtime, one index
//! rebuild per batch

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::error::{Error, Result};
use crate::ingestion::{ExtractorRegistry, TextChunker};
use crate::retrieval::{IndexSnapshot, IndexStore};
use crate::types::Chunk;

use super::job_queue::{Batch, BatchProgress, FileEvent, JobTracker, UploadedFile};

/// Message sent back from a parsing task
#[derive(Debug)]
struct FileOutcome {
    filename: String,
    result: Result<Vec<Chunk>>,
}

/// Worker that parses batches and rebuilds the index
pub struct ProcessingWorker {
    registry: Arc<ExtractorRegistry>,
    chunker: TextChunker,
    index: Arc<IndexStore>,
    tracker: JobTracker,
    parallel_files: usize,
}

impl ProcessingWorker {
    pub fn new(
        registry: Arc<ExtractorRegistry>,
        chunker: TextChunker,
        index: Arc<IndexStore>,
        tracker: JobTracker,
        parallel_files: usize,
    ) -> Self {
        Self {
            registry,
            chunker,
            index,
            tracker,
            parallel_files: parallel_files.max(1),
        }
    }

    /// Process batches until every `JobQueue` sender is dropped
    pub async fn run(self, mut receiver: mpsc::Receiver<Batch>) {
        tracing::info!(
            "Processing worker started: {} parallel file(s)",
            self.parallel_files
        );

        while let Some(batch) = receiver.recv().await {
            self.process_batch(batch).await;
        }

        tracing::info!("Processing worker stopped");
    }

    /// Extract and chunk every file, then rebuild the index once.
    ///
    /// Returns the batch's final progress record.
    pub async fn process_batch(&self, batch: Batch) -> Option<BatchProgress> {
        let batch_id = batch.id;
        let total = batch.files.len();
        let start_time = std::time::Instant::now();

        self.tracker.register(&batch);
        self.tracker.mark_processing(batch_id);
        tracing::info!("Processing batch {} with {} file(s)", batch_id, total);

        let (tx, mut rx) = mpsc::channel::<FileOutcome>(total.max(1));
        let semaphore = Arc::new(Semaphore::new(self.parallel_files));

        for file in batch.files {
            let tx = tx.clone();
            let semaphore = semaphore.clone();
            let registry = self.registry.clone();
            let chunker = self.chunker.clone();

            tokio::spawn(async move {
                let filename = file.filename.clone();
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => Self::parse_file(registry, chunker, file).await,
                    Err(e) => Err(Error::internal(format!("Parser pool closed: {}", e))),
                };
                // Receiver lives until every sender is gone
                let _ = tx.send(FileOutcome { filename, result }).await;
            });
        }
        drop(tx);

        let mut chunks = Vec::new();
        while let Some(outcome) = rx.recv().await {
            let event = match outcome.result {
                Ok(file_chunks) => {
                    tracing::info!(
                        "[{}] Parsed into {} chunk(s)",
                        outcome.filename,
                        file_chunks.len()
                    );
                    let event = FileEvent::complete(&outcome.filename, file_chunks.len());
                    chunks.extend(file_chunks);
                    event
                }
                Err(e) => {
                    tracing::warn!("[{}] Failed: {}", outcome.filename, e);
                    FileEvent::error(&outcome.filename, e.to_string())
                }
            };
            self.tracker.record_event(batch_id, event);
        }

        let snapshot = self.rebuild(chunks, batch.epoch).await;
        self.tracker
            .finish(batch_id, snapshot.as_ref().map(|s| s.version));

        tracing::info!(
            "Batch {} finished in {:.2}s",
            batch_id,
            start_time.elapsed().as_secs_f64()
        );

        self.tracker.get_progress(batch_id)
    }

    /// Extract and chunk one file on the blocking pool
    async fn parse_file(
        registry: Arc<ExtractorRegistry>,
        chunker: TextChunker,
        file: UploadedFile,
    ) -> Result<Vec<Chunk>> {
        let filename = file.filename.clone();

        tokio::task::spawn_blocking(move || {
            let (file_type, text) =
                registry.extract(file.content_type.as_deref(), &file.filename, &file.data)?;
            tracing::debug!(
                "[{}] Extracted {} chars as {}",
                file.filename,
                text.chars().count(),
                file_type
            );
            Ok(chunker.chunk_with_layout(&text, &file.filename, file_type.is_tabular()))
        })
        .await
        .map_err(|e| Error::extraction(filename, format!("Parser task failed: {}", e)))?
    }

    async fn rebuild(&self, chunks: Vec<Chunk>, epoch: u64) -> Option<Arc<IndexSnapshot>> {
        let index = self.index.clone();
        match tokio::task::spawn_blocking(move || index.extend_and_rebuild(chunks, epoch)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Index rebuild task failed: {}", e);
                None
            }
        }
    }
}
