//! Shared index holder with atomic snapshot swaps

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::index::{IndexBuilder, IndexSnapshot};
use crate::types::Chunk;

/// Holds the current index snapshot.
///
/// Readers clone the `Arc` and keep a consistent view for as long as they
/// need it. Writers build a complete replacement off to the side and swap
/// it in under a short write lock. Builds and resets are serialized.
pub struct IndexStore {
    current: RwLock<Arc<IndexSnapshot>>,
    writer: Mutex<()>,
    /// Bumped by every reset; batches started under an older epoch are dropped
    epoch: AtomicU64,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty(0))),
            writer: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().clone()
    }

    /// The current reset epoch
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Append a batch's chunks and rebuild the whole index.
    ///
    /// Returns `None` without touching the index if a reset happened since
    /// `epoch` was read.
    pub fn extend_and_rebuild(&self, chunks: Vec<Chunk>, epoch: u64) -> Option<Arc<IndexSnapshot>> {
        let _guard = self.writer.lock();

        if self.epoch() != epoch {
            tracing::info!(
                "Discarding {} chunk(s) from a batch started before reset",
                chunks.len()
            );
            return None;
        }

        let previous = self.snapshot();
        let mut documents: Vec<Chunk> = Vec::with_capacity(previous.documents.len() + chunks.len());
        documents.extend(previous.documents.iter().map(Chunk::unweighted));
        documents.extend(chunks);

        let snapshot = Arc::new(IndexBuilder::build(documents, previous.version + 1));
        *self.current.write() = snapshot.clone();

        tracing::info!(
            "Index rebuilt (v{}): {} chunks, {} terms",
            snapshot.version,
            snapshot.chunk_count(),
            snapshot.vocabulary_size()
        );

        Some(snapshot)
    }

    /// Drop all documents and idf together. Returns the new epoch.
    pub fn reset(&self) -> u64 {
        let _guard = self.writer.lock();

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let version = self.current.read().version + 1;
        *self.current.write() = Arc::new(IndexSnapshot::empty(version));

        tracing::info!("Index reset (v{}, epoch {})", version, epoch);
        epoch
    }
}
