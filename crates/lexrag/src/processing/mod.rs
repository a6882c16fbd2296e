//! Background batch processing with progress tracking

mod job_queue;
mod worker;

pub use job_queue::{
    Batch, BatchProgress, BatchStatus, FileEvent, FileStatus, JobQueue, JobTracker, UploadedFile,
};
pub use worker::ProcessingWorker;
