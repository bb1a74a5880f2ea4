//! Background execution of ingestion work
//!
//! The service layer only knows how to enqueue a unit of work that runs
//! off-request. The default implementation spawns onto the Tokio runtime; a
//! durable queue can be swapped in without touching the pipeline.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::ingestion::IngestionPipeline;

/// Enqueues ingestion work to run off the caller's task
pub trait JobScheduler: Send + Sync {
    fn schedule_ingestion(&self, document_id: Uuid, job_id: Uuid);
}

/// Runs ingestion jobs as detached Tokio tasks
pub struct TokioJobScheduler {
    pipeline: Arc<IngestionPipeline>,
}

impl TokioJobScheduler {
    pub fn new(pipeline: Arc<IngestionPipeline>) -> Self {
        Self { pipeline }
    }
}

impl JobScheduler for TokioJobScheduler {
    fn schedule_ingestion(&self, document_id: Uuid, job_id: Uuid) {
        debug!("Scheduling ingestion of document {document_id} (job {job_id})");
        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            pipeline
                .process_document_ingestion(document_id, Some(job_id))
                .await;
        });
    }
}
