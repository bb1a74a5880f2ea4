//! Persistence for knowledge bases, documents, chunks and jobs
//!
//! All entity CRUD, tenant-scoped listings and lifecycle transitions live
//! here. Chunk persistence delegates to the configured vector store.

use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{
    DocumentCreate, DocumentStatus, JobLogEntry, JobStatus, JobType, KnowledgeBase,
    KnowledgeBaseCreate, KnowledgeBaseUpdate, KnowledgeDocument, KnowledgeJob,
};
use crate::vector_store::{VectorChunkPayload, VectorStore};

/// A chunk produced by ingestion, not yet persisted. Ids are assigned at
/// save time so reingestion always writes fresh chunk ids.
#[derive(Debug, Clone)]
pub struct ChunkDraft {
    pub chunk_index: i32,
    pub token_count: i32,
    pub content: String,
    pub metadata: Value,
    pub embedding: Vec<f32>,
}

/// Repository over the four knowledge tables plus the vector store
pub struct KnowledgeRepository {
    pool: PgPool,
    vector_store: Arc<dyn VectorStore>,
}

impl KnowledgeRepository {
    pub fn new(pool: PgPool, vector_store: Arc<dyn VectorStore>) -> Self {
        Self { pool, vector_store }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create the knowledge tables and indexes if they do not exist.
    /// Idempotent, safe to run on every startup.
    pub async fn ensure_schema(pool: &PgPool, embedding_dimensions: usize) -> Result<()> {
        sqlx::raw_sql(&schema_sql(embedding_dimensions))
            .execute(pool)
            .await?;

        // HNSW needs pgvector >= 0.5; run separately so an old extension
        // degrades to sequential scans instead of failing the bootstrap.
        if let Err(e) = sqlx::raw_sql(
            "CREATE INDEX IF NOT EXISTS ix_knowledge_chunks_embedding
                 ON knowledge_chunks USING hnsw (embedding vector_cosine_ops)",
        )
        .execute(pool)
        .await
        {
            warn!("Could not create HNSW index on knowledge_chunks.embedding: {e}");
        }

        Ok(())
    }

    // ── Knowledge bases ────────────────────────────────────────────────

    pub async fn create_knowledge_base(
        &self,
        client_id: Uuid,
        create: KnowledgeBaseCreate,
    ) -> Result<KnowledgeBase> {
        create.validate()?;

        let base = KnowledgeBase {
            id: Uuid::new_v4(),
            client_id,
            name: create.name,
            description: create.description,
            language: create.language,
            embedding_model: create.embedding_model,
            chunk_size: create.chunk_size,
            chunk_overlap: create.chunk_overlap,
            is_active: true,
            config: create.config.unwrap_or_else(default_object),
            created_by: create.created_by,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO knowledge_bases
                (id, client_id, name, description, language, embedding_model,
                 chunk_size, chunk_overlap, is_active, config, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(base.id)
        .bind(base.client_id)
        .bind(&base.name)
        .bind(&base.description)
        .bind(&base.language)
        .bind(&base.embedding_model)
        .bind(base.chunk_size)
        .bind(base.chunk_overlap)
        .bind(base.is_active)
        .bind(&base.config)
        .bind(base.created_by)
        .bind(base.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Created knowledge base {} for client {}", base.id, client_id);
        Ok(base)
    }

    /// Active bases for a tenant, newest first, with optional
    /// case-insensitive name search
    pub async fn list_knowledge_bases(
        &self,
        client_id: Uuid,
        search: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<KnowledgeBase>> {
        let pattern = search.map(|s| format!("%{}%", s.to_lowercase()));

        let rows = sqlx::query(
            r#"
            SELECT * FROM knowledge_bases
            WHERE client_id = $1
              AND is_active = TRUE
              AND ($2::text IS NULL OR lower(name) LIKE $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(client_id)
        .bind(pattern)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_knowledge_base).collect()
    }

    /// Fetch a base by id, optionally constrained to a tenant. Archived
    /// bases stay reachable here.
    pub async fn get_knowledge_base(
        &self,
        base_id: Uuid,
        client_id: Option<Uuid>,
    ) -> Result<Option<KnowledgeBase>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM knowledge_bases
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            "#,
        )
        .bind(base_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_knowledge_base).transpose()
    }

    pub async fn update_knowledge_base(
        &self,
        base_id: Uuid,
        update: KnowledgeBaseUpdate,
    ) -> Result<Option<KnowledgeBase>> {
        update.validate()?;

        sqlx::query(
            r#"
            UPDATE knowledge_bases SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                language = COALESCE($4, language),
                embedding_model = COALESCE($5, embedding_model),
                chunk_size = COALESCE($6, chunk_size),
                chunk_overlap = COALESCE($7, chunk_overlap),
                config = COALESCE($8, config),
                updated_by = COALESCE($9, updated_by),
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(base_id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.language)
        .bind(&update.embedding_model)
        .bind(update.chunk_size)
        .bind(update.chunk_overlap)
        .bind(&update.config)
        .bind(update.updated_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_knowledge_base(base_id, None).await
    }

    /// Soft-delete: the base disappears from listings but stays reachable
    /// by id until hard deletion cascades it away
    pub async fn archive_knowledge_base(&self, base_id: Uuid) -> Result<Option<KnowledgeBase>> {
        sqlx::query("UPDATE knowledge_bases SET is_active = FALSE, updated_at = $2 WHERE id = $1")
            .bind(base_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        self.get_knowledge_base(base_id, None).await
    }

    // ── Documents ──────────────────────────────────────────────────────

    pub async fn create_document(
        &self,
        knowledge_base_id: Uuid,
        client_id: Uuid,
        create: DocumentCreate,
    ) -> Result<KnowledgeDocument> {
        let document = KnowledgeDocument {
            id: Uuid::new_v4(),
            knowledge_base_id,
            client_id,
            source_type: create.source_type,
            original_filename: create.original_filename,
            source_url: create.source_url,
            mime_type: create.mime_type,
            storage_path: create.storage_path,
            checksum: create.checksum,
            content_preview: create.content_preview,
            extra_metadata: create.metadata.unwrap_or_else(default_object),
            status: DocumentStatus::Pending,
            error_message: None,
            created_by: create.created_by,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: None,
            processing_started_at: None,
            processing_finished_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO knowledge_documents
                (id, knowledge_base_id, client_id, source_type, original_filename,
                 source_url, mime_type, storage_path, checksum, content_preview,
                 extra_metadata, status, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(document.id)
        .bind(document.knowledge_base_id)
        .bind(document.client_id)
        .bind(document.source_type.as_str())
        .bind(&document.original_filename)
        .bind(&document.source_url)
        .bind(&document.mime_type)
        .bind(&document.storage_path)
        .bind(&document.checksum)
        .bind(&document.content_preview)
        .bind(&document.extra_metadata)
        .bind(document.status.as_str())
        .bind(document.created_by)
        .bind(document.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Created {} document {} in base {}",
            document.source_type, document.id, knowledge_base_id
        );
        Ok(document)
    }

    /// Persist mutable artifact fields after side effects (storage writes,
    /// URL fetch stamps, ingestion stamps)
    pub async fn update_document(&self, document: &KnowledgeDocument) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE knowledge_documents SET
                original_filename = $2,
                source_url = $3,
                mime_type = $4,
                storage_path = $5,
                checksum = $6,
                content_preview = $7,
                extra_metadata = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(document.id)
        .bind(&document.original_filename)
        .bind(&document.source_url)
        .bind(&document.mime_type)
        .bind(&document.storage_path)
        .bind(&document.checksum)
        .bind(&document.content_preview)
        .bind(&document.extra_metadata)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Transition a document's status, stamping the lifecycle timestamps:
    /// `processing` sets `processing_started_at`, terminal statuses set
    /// `processing_finished_at`
    pub async fn update_document_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<Option<KnowledgeDocument>> {
        let now = Utc::now();
        let started_at = (status == DocumentStatus::Processing).then_some(now);
        let finished_at = status.is_terminal().then_some(now);

        sqlx::query(
            r#"
            UPDATE knowledge_documents SET
                status = $2,
                error_message = $3,
                processing_started_at = COALESCE($4, processing_started_at),
                processing_finished_at = COALESCE($5, processing_finished_at),
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .bind(status.as_str())
        .bind(error_message)
        .bind(started_at)
        .bind(finished_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_document(document_id, None).await
    }

    pub async fn list_documents(
        &self,
        knowledge_base_id: Uuid,
        status: Option<DocumentStatus>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<KnowledgeDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM knowledge_documents
            WHERE knowledge_base_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(knowledge_base_id)
        .bind(status.map(|s| s.as_str()))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_document).collect()
    }

    pub async fn get_document(
        &self,
        document_id: Uuid,
        client_id: Option<Uuid>,
    ) -> Result<Option<KnowledgeDocument>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM knowledge_documents
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            "#,
        )
        .bind(document_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_document).transpose()
    }

    // ── Jobs ───────────────────────────────────────────────────────────

    pub async fn create_job(&self, document_id: Uuid, job_type: JobType) -> Result<KnowledgeJob> {
        let job = KnowledgeJob {
            id: Uuid::new_v4(),
            document_id,
            job_type,
            status: JobStatus::Queued,
            attempts: 0,
            logs: Vec::new(),
            error_message: None,
            job_metadata: default_object(),
            queued_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO knowledge_jobs
                (id, document_id, job_type, status, attempts, logs, job_metadata, queued_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(job.id)
        .bind(job.document_id)
        .bind(job.job_type.as_str())
        .bind(job.status.as_str())
        .bind(job.attempts)
        .bind(serde_json::to_value(&job.logs)?)
        .bind(&job.job_metadata)
        .bind(job.queued_at)
        .execute(&self.pool)
        .await?;

        Ok(job)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<KnowledgeJob>> {
        let row = sqlx::query("SELECT * FROM knowledge_jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_job).transpose()
    }

    pub async fn list_jobs_for_document(&self, document_id: Uuid) -> Result<Vec<KnowledgeJob>> {
        let rows = sqlx::query(
            "SELECT * FROM knowledge_jobs WHERE document_id = $1 ORDER BY queued_at DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_job).collect()
    }

    /// Transition a job's status. Entering `processing` stamps `started_at`
    /// and increments `attempts`; terminal statuses stamp `finished_at`.
    /// A log message is appended to the job's ordered log.
    pub async fn update_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
        log_message: Option<&str>,
    ) -> Result<Option<KnowledgeJob>> {
        let Some(mut job) = self.get_job(job_id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        job.status = status;
        if status == JobStatus::Processing {
            job.started_at = Some(now);
            job.attempts += 1;
        } else if status.is_terminal() {
            job.finished_at = Some(now);
        }
        if let Some(message) = error_message {
            job.error_message = Some(message.to_string());
        }
        if let Some(message) = log_message {
            job.logs.push(JobLogEntry {
                timestamp: now,
                message: message.to_string(),
                status: status.as_str().to_string(),
            });
        }

        sqlx::query(
            r#"
            UPDATE knowledge_jobs SET
                status = $2,
                attempts = $3,
                logs = $4,
                error_message = $5,
                started_at = $6,
                finished_at = $7
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(job.status.as_str())
        .bind(job.attempts)
        .bind(serde_json::to_value(&job.logs)?)
        .bind(&job.error_message)
        .bind(job.started_at)
        .bind(job.finished_at)
        .execute(&self.pool)
        .await?;

        Ok(Some(job))
    }

    // ── Chunks ─────────────────────────────────────────────────────────

    /// Remove every stored chunk for a document
    pub async fn delete_chunks_for_document(&self, document_id: Uuid) -> Result<()> {
        let chunk_ids = self.vector_store.chunk_ids_for_document(document_id).await?;
        if chunk_ids.is_empty() {
            return Ok(());
        }
        self.vector_store.delete_chunks(&chunk_ids).await
    }

    /// Persist a batch of chunk drafts under fresh ids
    pub async fn save_document_chunks(
        &self,
        knowledge_base_id: Uuid,
        document_id: Uuid,
        drafts: Vec<ChunkDraft>,
    ) -> Result<Vec<Uuid>> {
        let payloads = draft_payloads(knowledge_base_id, document_id, drafts);
        let ids = payloads.iter().map(|p| p.chunk_id).collect();
        self.vector_store.upsert_chunks(&payloads).await?;
        Ok(ids)
    }

    /// Atomic replacement of a document's chunk set; delete and insert run
    /// in one vector store transaction
    pub async fn replace_document_chunks(
        &self,
        knowledge_base_id: Uuid,
        document_id: Uuid,
        drafts: Vec<ChunkDraft>,
    ) -> Result<Vec<Uuid>> {
        let payloads = draft_payloads(knowledge_base_id, document_id, drafts);
        let ids = payloads.iter().map(|p| p.chunk_id).collect();
        self.vector_store
            .replace_document_chunks(document_id, &payloads)
            .await?;
        Ok(ids)
    }

    pub async fn count_chunks_for_document(&self, document_id: Uuid) -> Result<i64> {
        self.vector_store.count_chunks_for_document(document_id).await
    }
}

fn draft_payloads(
    knowledge_base_id: Uuid,
    document_id: Uuid,
    drafts: Vec<ChunkDraft>,
) -> Vec<VectorChunkPayload> {
    drafts
        .into_iter()
        .map(|draft| VectorChunkPayload {
            chunk_id: Uuid::new_v4(),
            knowledge_base_id,
            document_id,
            chunk_index: draft.chunk_index,
            token_count: draft.token_count,
            content: draft.content,
            metadata: draft.metadata,
            embedding: draft.embedding,
        })
        .collect()
}

fn default_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn map_knowledge_base(row: &PgRow) -> Result<KnowledgeBase> {
    Ok(KnowledgeBase {
        id: row.get("id"),
        client_id: row.get("client_id"),
        name: row.get("name"),
        description: row.get("description"),
        language: row.get("language"),
        embedding_model: row.get("embedding_model"),
        chunk_size: row.get("chunk_size"),
        chunk_overlap: row.get("chunk_overlap"),
        is_active: row.get("is_active"),
        config: row.get("config"),
        created_by: row.get("created_by"),
        updated_by: row.get("updated_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_document(row: &PgRow) -> Result<KnowledgeDocument> {
    Ok(KnowledgeDocument {
        id: row.get("id"),
        knowledge_base_id: row.get("knowledge_base_id"),
        client_id: row.get("client_id"),
        source_type: row.get::<String, _>("source_type").parse()?,
        original_filename: row.get("original_filename"),
        source_url: row.get("source_url"),
        mime_type: row.get("mime_type"),
        storage_path: row.get("storage_path"),
        checksum: row.get("checksum"),
        content_preview: row.get("content_preview"),
        extra_metadata: row.get("extra_metadata"),
        status: row.get::<String, _>("status").parse()?,
        error_message: row.get("error_message"),
        created_by: row.get("created_by"),
        updated_by: row.get("updated_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        processing_started_at: row.get("processing_started_at"),
        processing_finished_at: row.get("processing_finished_at"),
    })
}

fn map_job(row: &PgRow) -> Result<KnowledgeJob> {
    Ok(KnowledgeJob {
        id: row.get("id"),
        document_id: row.get("document_id"),
        job_type: row.get::<String, _>("job_type").parse()?,
        status: row.get::<String, _>("status").parse()?,
        attempts: row.get("attempts"),
        logs: serde_json::from_value(row.get::<Value, _>("logs"))?,
        error_message: row.get("error_message"),
        job_metadata: row.get("job_metadata"),
        queued_at: row.get("queued_at"),
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
    })
}

fn schema_sql(embedding_dimensions: usize) -> String {
    format!(
        r#"
CREATE EXTENSION IF NOT EXISTS vector;

CREATE TABLE IF NOT EXISTS knowledge_bases (
    id UUID PRIMARY KEY,
    client_id UUID NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    language TEXT,
    embedding_model TEXT,
    chunk_size INTEGER NOT NULL,
    chunk_overlap INTEGER NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    config JSONB NOT NULL DEFAULT '{{}}'::jsonb,
    created_by UUID,
    updated_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS ix_knowledge_bases_client
    ON knowledge_bases(client_id);

CREATE TABLE IF NOT EXISTS knowledge_documents (
    id UUID PRIMARY KEY,
    knowledge_base_id UUID NOT NULL REFERENCES knowledge_bases(id) ON DELETE CASCADE,
    client_id UUID NOT NULL,
    source_type TEXT NOT NULL,
    original_filename TEXT,
    source_url TEXT,
    mime_type TEXT,
    storage_path TEXT,
    checksum TEXT,
    content_preview TEXT,
    extra_metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
    status TEXT NOT NULL DEFAULT 'pending',
    error_message TEXT,
    created_by UUID,
    updated_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ,
    processing_started_at TIMESTAMPTZ,
    processing_finished_at TIMESTAMPTZ,
    CONSTRAINT check_knowledge_document_status
        CHECK (status IN ('pending', 'processing', 'ready', 'error'))
);
CREATE INDEX IF NOT EXISTS ix_knowledge_documents_base_status
    ON knowledge_documents(knowledge_base_id, status);

CREATE TABLE IF NOT EXISTS knowledge_chunks (
    id UUID PRIMARY KEY,
    knowledge_base_id UUID NOT NULL REFERENCES knowledge_bases(id) ON DELETE CASCADE,
    document_id UUID NOT NULL REFERENCES knowledge_documents(id) ON DELETE CASCADE,
    chunk_index INTEGER NOT NULL,
    token_count INTEGER NOT NULL,
    content TEXT NOT NULL,
    chunk_metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
    embedding vector({embedding_dimensions}) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS ix_knowledge_chunks_document
    ON knowledge_chunks(document_id);
CREATE INDEX IF NOT EXISTS ix_knowledge_chunks_base_index
    ON knowledge_chunks(knowledge_base_id, chunk_index);

CREATE TABLE IF NOT EXISTS knowledge_jobs (
    id UUID PRIMARY KEY,
    document_id UUID NOT NULL REFERENCES knowledge_documents(id) ON DELETE CASCADE,
    job_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'queued',
    attempts INTEGER NOT NULL DEFAULT 0,
    logs JSONB NOT NULL DEFAULT '[]'::jsonb,
    error_message TEXT,
    job_metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
    queued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    started_at TIMESTAMPTZ,
    finished_at TIMESTAMPTZ,
    CONSTRAINT check_knowledge_job_status
        CHECK (status IN ('queued', 'processing', 'completed', 'failed'))
);
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_embeds_dimension() {
        let sql = schema_sql(1536);
        assert!(sql.contains("embedding vector(1536) NOT NULL"));
        assert!(sql.contains("CREATE EXTENSION IF NOT EXISTS vector"));
        assert!(sql.contains("check_knowledge_document_status"));
        assert!(sql.contains("check_knowledge_job_status"));
    }

    #[test]
    fn test_draft_payloads_assign_fresh_ids() {
        let base_id = Uuid::new_v4();
        let document_id = Uuid::new_v4();
        let drafts = vec![
            ChunkDraft {
                chunk_index: 0,
                token_count: 3,
                content: "alpha beta gamma".to_string(),
                metadata: serde_json::json!({}),
                embedding: vec![0.0; 3],
            },
            ChunkDraft {
                chunk_index: 1,
                token_count: 2,
                content: "delta epsilon".to_string(),
                metadata: serde_json::json!({}),
                embedding: vec![0.0; 3],
            },
        ];

        let payloads = draft_payloads(base_id, document_id, drafts);
        assert_eq!(payloads.len(), 2);
        assert_ne!(payloads[0].chunk_id, payloads[1].chunk_id);
        assert!(payloads
            .iter()
            .all(|p| p.knowledge_base_id == base_id && p.document_id == document_id));
    }
}
