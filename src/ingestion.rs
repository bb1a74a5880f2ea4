//! Background ingestion pipeline for knowledge documents
//!
//! Drives one document through extract → chunk → embed → persist, keeping the
//! document and job state machines in step. Failures between the processing
//! transition and the final chunk write are recorded on both records and
//! never re-raised to the executor.

use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::chunker::{word_count, ContentChunker};
use crate::config::ChunkingDefaults;
use crate::embedding::EmbeddingClient;
use crate::error::{EmbeddingError, ExtractionError, KnowledgeError, Result};
use crate::extract::TextExtractor;
use crate::model::{DocumentStatus, JobStatus, KnowledgeDocument};
use crate::repository::{ChunkDraft, KnowledgeRepository};

/// Orchestrates document ingestion end to end
pub struct IngestionPipeline {
    repository: Arc<KnowledgeRepository>,
    extractor: TextExtractor,
    embedding_client: EmbeddingClient,
    defaults: ChunkingDefaults,
}

impl IngestionPipeline {
    pub fn new(
        repository: Arc<KnowledgeRepository>,
        extractor: TextExtractor,
        embedding_client: EmbeddingClient,
        defaults: ChunkingDefaults,
    ) -> Self {
        Self {
            repository,
            extractor,
            embedding_client,
            defaults,
        }
    }

    /// Entry point executed by the background scheduler, one call per job.
    ///
    /// Never returns an error: failures are written to the document and job
    /// records, and a secondary failure while recording is only logged.
    pub async fn process_document_ingestion(&self, document_id: Uuid, job_id: Option<Uuid>) {
        if let Some(job_id) = job_id {
            if let Err(e) = self
                .repository
                .update_job_status(job_id, JobStatus::Processing, None, Some("Started ingestion"))
                .await
            {
                warn!("Unable to mark job {job_id} as processing: {e}");
            }
        }

        match self.run(document_id).await {
            Ok(chunk_total) => {
                info!("Ingested document {document_id} into {chunk_total} chunks");
                if let Some(job_id) = job_id {
                    if let Err(e) = self
                        .repository
                        .update_job_status(
                            job_id,
                            JobStatus::Completed,
                            None,
                            Some("Ingestion completed"),
                        )
                        .await
                    {
                        warn!("Unable to mark job {job_id} as completed: {e}");
                    }
                }
            }
            Err(exc) => {
                error!("Error ingesting document {document_id}: {exc}");
                let message = exc.to_string();
                if let Err(e) = self
                    .repository
                    .update_document_status(document_id, DocumentStatus::Error, Some(&message))
                    .await
                {
                    error!("Unable to update document status for {document_id}: {e}");
                }
                if let Some(job_id) = job_id {
                    if let Err(e) = self
                        .repository
                        .update_job_status(
                            job_id,
                            JobStatus::Failed,
                            Some(&message),
                            Some("Ingestion failed"),
                        )
                        .await
                    {
                        error!("Unable to update job status for {job_id}: {e}");
                    }
                }
            }
        }
    }

    /// The fallible middle of the pipeline; returns the new chunk count
    async fn run(&self, document_id: Uuid) -> Result<usize> {
        let mut document = self
            .repository
            .get_document(document_id, None)
            .await?
            .ok_or_else(|| KnowledgeError::NotFound("Document not found".to_string()))?;

        self.repository
            .update_document_status(document.id, DocumentStatus::Processing, None)
            .await?;

        // Any failure from here on, the missing base included, lands the
        // document in `error` from `processing`
        let base = self
            .repository
            .get_knowledge_base(document.knowledge_base_id, None)
            .await?
            .ok_or_else(|| KnowledgeError::NotFound("Knowledge base not found".to_string()))?;

        let raw_text = self.extractor.extract(&mut document).await?;
        if raw_text.trim().is_empty() {
            return Err(ExtractionError::EmptyContent.into());
        }

        let chunk_size = if base.chunk_size > 0 {
            base.chunk_size as usize
        } else {
            self.defaults.max_chunk_tokens
        };
        let chunk_overlap = if base.chunk_overlap > 0 {
            base.chunk_overlap as usize
        } else {
            self.defaults.chunk_overlap
        };

        // The empty-content check above plus the chunker's coverage
        // guarantee mean this always yields at least one chunk
        let chunker = ContentChunker::new(chunk_size, chunk_overlap);
        let chunks = chunker.chunk(&raw_text);

        let embeddings = self.embedding_client.generate_embeddings(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(EmbeddingError::CountMismatch.into());
        }

        let drafts: Vec<ChunkDraft> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(idx, (content, embedding))| ChunkDraft {
                chunk_index: idx as i32,
                token_count: word_count(&content) as i32,
                content,
                metadata: build_chunk_metadata(&document, idx),
                embedding,
            })
            .collect();
        let chunk_total = drafts.len();

        // Delete and insert share one transaction, so a reader never sees
        // the document with zero chunks in between
        self.repository
            .replace_document_chunks(document.knowledge_base_id, document.id, drafts)
            .await?;

        document.set_last_processed_at(Utc::now());
        self.repository.update_document(&document).await?;

        self.repository
            .update_document_status(document.id, DocumentStatus::Ready, None)
            .await?;

        Ok(chunk_total)
    }
}

/// Provenance carried on every chunk, used to label retrieval sources
fn build_chunk_metadata(document: &KnowledgeDocument, chunk_index: usize) -> Value {
    let mut metadata = json!({
        "source_type": document.source_type.as_str(),
        "document_id": document.id.to_string(),
        "knowledge_base_id": document.knowledge_base_id.to_string(),
        "chunk_index": chunk_index,
    });
    if let Some(map) = metadata.as_object_mut() {
        if let Some(filename) = &document.original_filename {
            map.insert("original_filename".to_string(), json!(filename));
        }
        if let Some(url) = &document.source_url {
            map.insert("source_url".to_string(), json!(url));
        }
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceType;

    fn test_document() -> KnowledgeDocument {
        KnowledgeDocument {
            id: Uuid::new_v4(),
            knowledge_base_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            source_type: SourceType::Upload,
            original_filename: Some("report.pdf".to_string()),
            source_url: None,
            mime_type: Some("application/pdf".to_string()),
            storage_path: None,
            checksum: None,
            content_preview: None,
            extra_metadata: json!({}),
            status: DocumentStatus::Processing,
            error_message: None,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: None,
            processing_started_at: None,
            processing_finished_at: None,
        }
    }

    #[test]
    fn test_chunk_metadata_fields() {
        let document = test_document();
        let metadata = build_chunk_metadata(&document, 3);

        assert_eq!(metadata["source_type"], "upload");
        assert_eq!(metadata["document_id"], document.id.to_string());
        assert_eq!(
            metadata["knowledge_base_id"],
            document.knowledge_base_id.to_string()
        );
        assert_eq!(metadata["chunk_index"], 3);
        assert_eq!(metadata["original_filename"], "report.pdf");
        assert!(metadata.get("source_url").is_none());
    }

    #[test]
    fn test_chunk_metadata_url_source() {
        let mut document = test_document();
        document.source_type = SourceType::Url;
        document.original_filename = None;
        document.source_url = Some("https://example.com/page".to_string());

        let metadata = build_chunk_metadata(&document, 0);
        assert_eq!(metadata["source_url"], "https://example.com/page");
        assert!(metadata.get("original_filename").is_none());
    }
}
