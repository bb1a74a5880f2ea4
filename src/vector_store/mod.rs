//! Storage backends for chunk embeddings and similarity search
//!
//! The [`VectorStore`] trait keeps the surface small (upsert, delete, search,
//! plus an atomic per-document replace) so alternative providers can be
//! plugged in without touching ingestion or retrieval logic. Inputs and
//! outputs are plain value records.

pub mod pgvector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::VectorStoreConfig;
use crate::error::{KnowledgeError, Result};

pub use self::pgvector::PgVectorStore;

/// A chunk with its embedding, ready for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorChunkPayload {
    pub chunk_id: Uuid,
    pub knowledge_base_id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub token_count: i32,
    pub content: String,
    pub metadata: Value,
    pub embedding: Vec<f32>,
}

/// One similarity search hit.
///
/// `score` is similarity (`1 − cosine distance`), not the raw distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchResult {
    pub chunk_id: Uuid,
    pub knowledge_base_id: Uuid,
    pub document_id: Uuid,
    pub score: f64,
    pub content: String,
    pub metadata: Value,
    pub chunk_index: i32,
    pub token_count: i32,
}

/// Contract every vector store implementation must follow
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or update chunk embeddings and metadata, keyed by chunk id.
    /// The whole batch is applied atomically.
    async fn upsert_chunks(&self, chunks: &[VectorChunkPayload]) -> Result<()>;

    /// Remove chunks by id; an empty id set succeeds silently
    async fn delete_chunks(&self, chunk_ids: &[Uuid]) -> Result<()>;

    /// Ids of all chunks currently stored for a document
    async fn chunk_ids_for_document(&self, document_id: Uuid) -> Result<Vec<Uuid>>;

    /// Number of chunks currently stored for a document
    async fn count_chunks_for_document(&self, document_id: Uuid) -> Result<i64>;

    /// Atomically replace a document's chunks: existing chunks are deleted
    /// and the new batch is upserted inside one transaction, so observers
    /// never see the document with zero chunks in between.
    async fn replace_document_chunks(
        &self,
        document_id: Uuid,
        chunks: &[VectorChunkPayload],
    ) -> Result<()>;

    /// Retrieve up to `top_k` chunks from the given bases ordered by
    /// ascending cosine distance. When `score_threshold` is set, results
    /// whose distance exceeds it are dropped.
    async fn similarity_search(
        &self,
        knowledge_base_ids: &[Uuid],
        query_embedding: &[f32],
        top_k: usize,
        score_threshold: Option<f64>,
    ) -> Result<Vec<VectorSearchResult>>;
}

/// Return the configured vector store implementation
pub fn create_vector_store(
    config: &VectorStoreConfig,
    pool: PgPool,
) -> Result<Arc<dyn VectorStore>> {
    match config.provider.to_lowercase().as_str() {
        "pgvector" => Ok(Arc::new(PgVectorStore::new(pool))),
        other => Err(KnowledgeError::Config(format!(
            "Unsupported VECTOR_STORE_PROVIDER: {other}"
        ))),
    }
}
