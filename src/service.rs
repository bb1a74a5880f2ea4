//! Logical operations exposed to the transport layer
//!
//! Everything an HTTP or CLI front end needs: knowledge base CRUD, the three
//! document creation paths, listings, and reprocessing. Boundary validation
//! (upload size, MIME allow-list, content bounds) happens here; persistence
//! rules live in the repository.

use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{KnowledgeError, Result};
use crate::model::{
    DocumentCreate, DocumentStatus, JobType, KnowledgeBase, KnowledgeBaseCreate,
    KnowledgeBaseUpdate, KnowledgeDocument, SourceType,
};
use crate::repository::KnowledgeRepository;
use crate::scheduler::JobScheduler;
use crate::storage::StorageSink;

const MAX_TEXT_CONTENT_CHARS: usize = 200_000;
const PREVIEW_CHARS: usize = 4000;

/// Front door for knowledge base and document operations
pub struct KnowledgeService {
    repository: Arc<KnowledgeRepository>,
    storage: StorageSink,
    scheduler: Arc<dyn JobScheduler>,
    storage_config: StorageConfig,
}

impl KnowledgeService {
    pub fn new(
        repository: Arc<KnowledgeRepository>,
        storage: StorageSink,
        scheduler: Arc<dyn JobScheduler>,
        storage_config: StorageConfig,
    ) -> Self {
        Self {
            repository,
            storage,
            scheduler,
            storage_config,
        }
    }

    // ── Knowledge bases ────────────────────────────────────────────────

    pub async fn create_knowledge_base(
        &self,
        client_id: Uuid,
        create: KnowledgeBaseCreate,
    ) -> Result<KnowledgeBase> {
        self.repository.create_knowledge_base(client_id, create).await
    }

    pub async fn list_knowledge_bases(
        &self,
        client_id: Uuid,
        search: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<KnowledgeBase>> {
        self.repository
            .list_knowledge_bases(client_id, search, skip.max(0), limit.clamp(1, 200))
            .await
    }

    pub async fn get_knowledge_base(
        &self,
        client_id: Uuid,
        base_id: Uuid,
    ) -> Result<KnowledgeBase> {
        self.repository
            .get_knowledge_base(base_id, Some(client_id))
            .await?
            .ok_or_else(|| KnowledgeError::NotFound("Knowledge base not found".to_string()))
    }

    pub async fn update_knowledge_base(
        &self,
        client_id: Uuid,
        base_id: Uuid,
        update: KnowledgeBaseUpdate,
    ) -> Result<KnowledgeBase> {
        // Tenant scoping first, so a foreign base behaves like a missing one
        self.get_knowledge_base(client_id, base_id).await?;
        self.repository
            .update_knowledge_base(base_id, update)
            .await?
            .ok_or_else(|| KnowledgeError::NotFound("Knowledge base not found".to_string()))
    }

    pub async fn archive_knowledge_base(
        &self,
        client_id: Uuid,
        base_id: Uuid,
    ) -> Result<KnowledgeBase> {
        self.get_knowledge_base(client_id, base_id).await?;
        self.repository
            .archive_knowledge_base(base_id)
            .await?
            .ok_or_else(|| KnowledgeError::NotFound("Knowledge base not found".to_string()))
    }

    // ── Documents ──────────────────────────────────────────────────────

    /// Register an uploaded binary document and schedule its ingestion
    #[allow(clippy::too_many_arguments)]
    pub async fn upload_document(
        &self,
        client_id: Uuid,
        base_id: Uuid,
        filename: Option<&str>,
        mime_type: Option<&str>,
        data: &[u8],
        description: Option<&str>,
        created_by: Option<Uuid>,
    ) -> Result<KnowledgeDocument> {
        self.get_knowledge_base(client_id, base_id).await?;

        if data.is_empty() {
            return Err(KnowledgeError::Validation(
                "Uploaded file is empty".to_string(),
            ));
        }
        if data.len() > self.storage_config.max_upload_bytes() {
            return Err(KnowledgeError::Validation(format!(
                "File exceeds {}MB limit",
                self.storage_config.max_upload_size_mb
            )));
        }

        let mime_type = mime_type.unwrap_or("application/octet-stream");
        if !self.storage_config.is_mime_allowed(mime_type) {
            return Err(KnowledgeError::Validation(format!(
                "MIME type {mime_type} is not allowed"
            )));
        }

        let filename = filename.unwrap_or("document");
        let metadata = description
            .map(|d| json!({ "description": d }))
            .unwrap_or_else(|| json!({}));

        let mut create = DocumentCreate::new(SourceType::Upload);
        create.original_filename = Some(filename.to_string());
        create.mime_type = Some(mime_type.to_string());
        create.content_preview = description.map(String::from);
        create.metadata = Some(metadata);
        create.created_by = created_by;

        let mut document = self
            .repository
            .create_document(base_id, client_id, create)
            .await?;

        let storage_path = self
            .storage
            .persist_upload(client_id, base_id, document.id, filename, data)
            .await?;
        document.storage_path = Some(storage_path.to_string_lossy().into_owned());
        document.checksum = Some(checksum_of(data));
        self.repository.update_document(&document).await?;

        self.schedule_ingest(&document, JobType::Ingest).await?;
        info!(
            "Accepted upload {} ({} bytes) into base {}",
            document.id,
            data.len(),
            base_id
        );
        Ok(document)
    }

    /// Create a document from pasted text and schedule its ingestion
    pub async fn create_text_document(
        &self,
        client_id: Uuid,
        base_id: Uuid,
        title: Option<&str>,
        content: &str,
        created_by: Option<Uuid>,
    ) -> Result<KnowledgeDocument> {
        self.get_knowledge_base(client_id, base_id).await?;

        if content.is_empty() {
            return Err(KnowledgeError::Validation(
                "Text content cannot be empty".to_string(),
            ));
        }
        if content.chars().count() > MAX_TEXT_CONTENT_CHARS {
            return Err(KnowledgeError::Validation(format!(
                "Text content exceeds {MAX_TEXT_CONTENT_CHARS} characters"
            )));
        }

        let mut metadata = json!({ "raw_text": content });
        if let Some(title) = title {
            metadata["title"] = json!(title);
        }

        let mut create = DocumentCreate::new(SourceType::Text);
        create.mime_type = Some("text/plain".to_string());
        create.content_preview = Some(preview_of(content));
        create.metadata = Some(metadata);
        create.created_by = created_by;

        let mut document = self
            .repository
            .create_document(base_id, client_id, create)
            .await?;

        let storage_path = self
            .storage
            .persist_text(client_id, base_id, document.id, content, ".txt")
            .await?;
        document.storage_path = Some(storage_path.to_string_lossy().into_owned());
        self.repository.update_document(&document).await?;

        self.schedule_ingest(&document, JobType::Ingest).await?;
        Ok(document)
    }

    /// Register a URL document and schedule its ingestion. The page itself
    /// is fetched during ingestion, not here.
    pub async fn create_url_document(
        &self,
        client_id: Uuid,
        base_id: Uuid,
        url: &str,
        description: Option<&str>,
        created_by: Option<Uuid>,
    ) -> Result<KnowledgeDocument> {
        self.get_knowledge_base(client_id, base_id).await?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(KnowledgeError::Validation(format!("Invalid URL: {url}")));
        }

        let metadata = description
            .map(|d| json!({ "description": d }))
            .unwrap_or_else(|| json!({}));

        let mut create = DocumentCreate::new(SourceType::Url);
        create.source_url = Some(url.to_string());
        create.mime_type = Some("text/html".to_string());
        create.content_preview = description.map(String::from);
        create.metadata = Some(metadata);
        create.created_by = created_by;

        let document = self
            .repository
            .create_document(base_id, client_id, create)
            .await?;

        // Keep a traceable artifact of what was requested, before any fetch
        self.storage
            .persist_text(
                client_id,
                base_id,
                document.id,
                &format!("URL: {url}\nDescription: {}", description.unwrap_or("")),
                ".meta.txt",
            )
            .await?;

        self.schedule_ingest(&document, JobType::Ingest).await?;
        Ok(document)
    }

    pub async fn list_documents(
        &self,
        client_id: Uuid,
        base_id: Uuid,
        status: Option<DocumentStatus>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<KnowledgeDocument>> {
        self.get_knowledge_base(client_id, base_id).await?;
        self.repository
            .list_documents(base_id, status, skip.max(0), limit.clamp(1, 200))
            .await
    }

    pub async fn get_document(
        &self,
        client_id: Uuid,
        document_id: Uuid,
    ) -> Result<KnowledgeDocument> {
        self.repository
            .get_document(document_id, Some(client_id))
            .await?
            .ok_or_else(|| KnowledgeError::NotFound("Knowledge document not found".to_string()))
    }

    /// Reset a document to `pending` and schedule a fresh ingestion pass
    pub async fn reprocess_document(
        &self,
        client_id: Uuid,
        document_id: Uuid,
    ) -> Result<KnowledgeDocument> {
        let document = self.get_document(client_id, document_id).await?;

        let document = self
            .repository
            .update_document_status(document.id, DocumentStatus::Pending, None)
            .await?
            .ok_or_else(|| KnowledgeError::NotFound("Knowledge document not found".to_string()))?;

        self.schedule_ingest(&document, JobType::Reprocess).await?;
        Ok(document)
    }

    async fn schedule_ingest(
        &self,
        document: &KnowledgeDocument,
        job_type: JobType,
    ) -> Result<()> {
        let job = self.repository.create_job(document.id, job_type).await?;
        self.scheduler.schedule_ingestion(document.id, job.id);
        Ok(())
    }
}

/// First 4000 characters, respecting char boundaries
fn preview_of(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

/// Compute the hex SHA-256 checksum recorded for uploads
pub fn checksum_of(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
