//! Upload batches and their progress

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Batch status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Waiting for the worker
    Queued,
    /// Files are being parsed
    Processing,
    /// Every file reported and the index was rebuilt
    Complete,
    /// A reset happened while the batch was in flight
    Discarded,
}

/// Terminal outcome of one file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Complete { chunk_count: usize },
    Error { reason: String },
}

/// One per file, emitted when the file reaches its terminal outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEvent {
    pub file: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileEvent {
    pub fn complete(file: impl Into<String>, chunk_count: usize) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Complete { chunk_count },
        }
    }

    pub fn error(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Error {
                reason: reason.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, FileStatus::Error { .. })
    }
}

/// Progress information for a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    pub batch_id: Uuid,
    pub status: BatchStatus,
    pub total_files: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub chunks_added: usize,
    /// Per-file outcomes in arrival order
    pub events: Vec<FileEvent>,
    /// Snapshot produced by this batch's rebuild
    pub index_version: Option<u64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl BatchProgress {
    pub fn new(batch_id: Uuid, total_files: usize) -> Self {
        let now = chrono::Utc::now();
        Self {
            batch_id,
            status: BatchStatus::Queued,
            total_files,
            files_processed: 0,
            files_failed: 0,
            chunks_added: 0,
            events: Vec::new(),
            index_version: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Every file has reported
    pub fn all_reported(&self) -> bool {
        self.files_processed >= self.total_files
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, BatchStatus::Complete | BatchStatus::Discarded)
    }

    pub fn percent_complete(&self) -> f32 {
        if self.total_files == 0 {
            return 100.0;
        }
        self.files_processed as f32 / self.total_files as f32 * 100.0
    }
}

/// An uploaded file awaiting extraction
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// MIME type declared by the client
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            data,
        }
    }
}

/// Files submitted together in one upload
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: Uuid,
    /// Index reset epoch at submission time
    pub epoch: u64,
    pub files: Vec<UploadedFile>,
}

impl Batch {
    pub fn new(files: Vec<UploadedFile>, epoch: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            files,
        }
    }
}

/// Finished batches kept for progress queries
const MAX_FINISHED_BATCHES: usize = 100;

/// Progress records for every known batch.
///
/// Cloning shares the same records. The worker holds a tracker rather than
/// the queue, so dropping the queue closes the batch channel.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    batches: Arc<DashMap<Uuid, BatchProgress>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a batch. Idempotent.
    pub fn register(&self, batch: &Batch) {
        self.batches
            .entry(batch.id)
            .or_insert_with(|| BatchProgress::new(batch.id, batch.files.len()));
    }

    pub fn mark_processing(&self, batch_id: Uuid) {
        if let Some(mut progress) = self.batches.get_mut(&batch_id) {
            progress.status = BatchStatus::Processing;
            progress.updated_at = chrono::Utc::now();
        }
    }

    /// Record a file's terminal outcome
    pub fn record_event(&self, batch_id: Uuid, event: FileEvent) {
        if let Some(mut progress) = self.batches.get_mut(&batch_id) {
            progress.files_processed += 1;
            match &event.status {
                FileStatus::Complete { chunk_count } => progress.chunks_added += chunk_count,
                FileStatus::Error { .. } => progress.files_failed += 1,
            }
            progress.events.push(event);
            progress.updated_at = chrono::Utc::now();
        }
    }

    /// Close out a batch after its rebuild (`None` when it was discarded)
    pub fn finish(&self, batch_id: Uuid, index_version: Option<u64>) {
        if let Some(mut progress) = self.batches.get_mut(&batch_id) {
            progress.status = match index_version {
                Some(_) => BatchStatus::Complete,
                None => BatchStatus::Discarded,
            };
            progress.index_version = index_version;
            progress.updated_at = chrono::Utc::now();
        }
        self.prune_finished(MAX_FINISHED_BATCHES);
    }

    /// Drop the oldest finished batches beyond `keep`
    pub fn prune_finished(&self, keep: usize) {
        let mut finished: Vec<(chrono::DateTime<chrono::Utc>, Uuid)> = self
            .batches
            .iter()
            .filter(|e| e.is_finished())
            .map(|e| (e.updated_at, e.batch_id))
            .collect();

        if finished.len() <= keep {
            return;
        }

        finished.sort();
        let excess = finished.len() - keep;
        for (_, batch_id) in finished.into_iter().take(excess) {
            self.batches.remove(&batch_id);
        }
        tracing::debug!("Pruned {} finished batch record(s)", excess);
    }

    /// Forget every finished batch. Unfinished ones keep reporting.
    pub fn clear_finished(&self) {
        self.batches.retain(|_, progress| !progress.is_finished());
    }

    pub fn get_progress(&self, batch_id: Uuid) -> Option<BatchProgress> {
        self.batches.get(&batch_id).map(|p| p.clone())
    }

    /// All batches, oldest first
    pub fn list(&self) -> Vec<BatchProgress> {
        let mut batches: Vec<BatchProgress> =
            self.batches.iter().map(|e| e.value().clone()).collect();
        batches.sort_by_key(|b| b.created_at);
        batches
    }

    /// Batches not yet complete or discarded
    pub fn batches_in_flight(&self) -> usize {
        self.batches.iter().filter(|e| !e.is_finished()).count()
    }

    /// Files in unfinished batches that have not reported yet
    pub fn files_in_flight(&self) -> usize {
        self.batches
            .iter()
            .filter(|e| !e.is_finished())
            .map(|e| e.total_files.saturating_sub(e.files_processed))
            .sum()
    }
}

/// Hands batches to the worker. Dropping it ends the worker loop.
pub struct JobQueue {
    tracker: JobTracker,
    sender: mpsc::Sender<Batch>,
}

impl JobQueue {
    /// Create a queue and the receiver the worker drains
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Batch>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Self {
            tracker: JobTracker::new(),
            sender,
        };
        (queue, receiver)
    }

    /// Progress records shared with the worker
    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    /// Register a batch and queue it for parsing
    pub async fn submit(&self, batch: Batch) -> Result<Uuid> {
        let batch_id = batch.id;
        self.tracker.register(&batch);

        tracing::info!("Queued batch {} with {} file(s)", batch_id, batch.files.len());

        if let Err(e) = self.sender.send(batch).await {
            self.tracker.batches.remove(&batch_id);
            return Err(Error::internal(format!("Processing worker unavailable: {}", e)));
        }

        Ok(batch_id)
    }

    pub fn get_progress(&self, batch_id: Uuid) -> Option<BatchProgress> {
        self.tracker.get_progress(batch_id)
    }

    pub fn list(&self) -> Vec<BatchProgress> {
        self.tracker.list()
    }

    pub fn batches_in_flight(&self) -> usize {
        self.tracker.batches_in_flight()
    }

    pub fn files_in_flight(&self) -> usize {
        self.tracker.files_in_flight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> Batch {
        let files = (0..n)
            .map(|i| UploadedFile::new(format!("file{}.csv", i), None, Vec::new()))
            .collect();
        Batch::new(files, 0)
    }

    #[tokio::test]
    async fn test_submit_and_receive() {
        let (queue, mut receiver) = JobQueue::new(4);
        let id = queue.submit(batch(2)).await.unwrap();

        let progress = queue.get_progress(id).unwrap();
        assert_eq!(progress.status, BatchStatus::Queued);
        assert_eq!(progress.total_files, 2);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.id, id);
        assert_eq!(queue.files_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_submit_without_worker_fails() {
        let (queue, receiver) = JobQueue::new(1);
        drop(receiver);
        assert!(queue.submit(batch(1)).await.is_err());
        assert!(queue.list().is_empty());
    }

    #[test]
    fn test_event_accounting() {
        let (queue, _receiver) = JobQueue::new(1);
        let tracker = queue.tracker();
        let b = batch(3);
        tracker.register(&b);
        tracker.mark_processing(b.id);

        tracker.record_event(b.id, FileEvent::complete("a.csv", 4));
        tracker.record_event(b.id, FileEvent::error("b.png", "Unsupported file type: image/png"));
        assert_eq!(queue.files_in_flight(), 1);

        tracker.record_event(b.id, FileEvent::complete("c.csv", 2));
        let progress = queue.get_progress(b.id).unwrap();
        assert!(progress.all_reported());
        assert_eq!(progress.files_failed, 1);
        assert_eq!(progress.chunks_added, 6);
        assert_eq!(progress.events.len(), 3);
        assert_eq!(queue.batches_in_flight(), 1);

        tracker.finish(b.id, Some(7));
        let progress = queue.get_progress(b.id).unwrap();
        assert_eq!(progress.status, BatchStatus::Complete);
        assert_eq!(progress.index_version, Some(7));
        assert_eq!(queue.batches_in_flight(), 0);
    }

    #[test]
    fn test_discarded_batch() {
        let tracker = JobTracker::new();
        let b = batch(1);
        tracker.register(&b);
        tracker.finish(b.id, None);
        assert_eq!(tracker.get_progress(b.id).unwrap().status, BatchStatus::Discarded);
    }

    #[test]
    fn test_prune_keeps_newest_finished() {
        let tracker = JobTracker::new();
        let batches: Vec<Batch> = (0..4).map(|_| batch(1)).collect();
        for b in &batches {
            tracker.register(b);
        }
        for b in &batches[..3] {
            tracker.finish(b.id, Some(1));
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        tracker.prune_finished(2);
        assert!(tracker.get_progress(batches[0].id).is_none());
        assert!(tracker.get_progress(batches[1].id).is_some());
        assert!(tracker.get_progress(batches[2].id).is_some());
        // Unfinished batches are never pruned
        assert!(tracker.get_progress(batches[3].id).is_some());
    }

    #[test]
    fn test_finished_records_are_capped() {
        let tracker = JobTracker::new();
        for _ in 0..(MAX_FINISHED_BATCHES + 5) {
            let b = batch(1);
            tracker.register(&b);
            tracker.finish(b.id, Some(1));
        }
        assert_eq!(tracker.list().len(), MAX_FINISHED_BATCHES);
    }

    #[test]
    fn test_clear_finished() {
        let tracker = JobTracker::new();
        let done = batch(1);
        let running = batch(2);
        tracker.register(&done);
        tracker.register(&running);
        tracker.finish(done.id, Some(1));

        tracker.clear_finished();
        assert!(tracker.get_progress(done.id).is_none());
        assert_eq!(tracker.files_in_flight(), 2);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(FileEvent::complete("a.pdf", 3)).unwrap();
        assert_eq!(json["file"], "a.pdf");
        assert_eq!(json["status"], "complete");
        assert_eq!(json["chunk_count"], 3);

        let json = serde_json::to_value(FileEvent::error("b.png", "nope")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["reason"], "nope");
    }
}
