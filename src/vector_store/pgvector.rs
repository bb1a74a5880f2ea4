//! pgvector-backed implementation of the vector store contract
//!
//! Chunks live in the `knowledge_chunks` table with an `embedding vector(N)`
//! column. Search orders by the `<=>` cosine-distance operator; the score
//! threshold is applied after rows come back, matching a SQL predicate on
//! the same expression.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{VectorChunkPayload, VectorSearchResult, VectorStore};
use crate::error::{KnowledgeError, Result};

/// Persists embeddings inside the `knowledge_chunks` table using pgvector
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_into<'e, E>(executor: E, chunk: &VectorChunkPayload) -> Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO knowledge_chunks
                (id, knowledge_base_id, document_id, chunk_index, token_count,
                 content, chunk_metadata, embedding)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                knowledge_base_id = EXCLUDED.knowledge_base_id,
                document_id = EXCLUDED.document_id,
                chunk_index = EXCLUDED.chunk_index,
                token_count = EXCLUDED.token_count,
                content = EXCLUDED.content,
                chunk_metadata = EXCLUDED.chunk_metadata,
                embedding = EXCLUDED.embedding
            "#,
        )
        .bind(chunk.chunk_id)
        .bind(chunk.knowledge_base_id)
        .bind(chunk.document_id)
        .bind(chunk.chunk_index)
        .bind(chunk.token_count)
        .bind(&chunk.content)
        .bind(&chunk.metadata)
        .bind(Vector::from(chunk.embedding.clone()))
        .execute(executor)
        .await
        .map_err(store_error)?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn upsert_chunks(&self, chunks: &[VectorChunkPayload]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(store_error)?;
        for chunk in chunks {
            Self::upsert_into(&mut *tx, chunk).await?;
        }
        tx.commit().await.map_err(store_error)?;

        debug!("Upserted {} chunks", chunks.len());
        Ok(())
    }

    async fn delete_chunks(&self, chunk_ids: &[Uuid]) -> Result<()> {
        if chunk_ids.is_empty() {
            return Ok(());
        }

        sqlx::query("DELETE FROM knowledge_chunks WHERE id = ANY($1)")
            .bind(chunk_ids.to_vec())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn chunk_ids_for_document(&self, document_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM knowledge_chunks WHERE document_id = $1")
            .bind(document_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn count_chunks_for_document(&self, document_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM knowledge_chunks WHERE document_id = $1")
            .bind(document_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.get("count"))
    }

    async fn replace_document_chunks(
        &self,
        document_id: Uuid,
        chunks: &[VectorChunkPayload],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        sqlx::query("DELETE FROM knowledge_chunks WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        for chunk in chunks {
            Self::upsert_into(&mut *tx, chunk).await?;
        }

        tx.commit().await.map_err(store_error)?;
        debug!(
            "Replaced chunks for document {} with {} new chunks",
            document_id,
            chunks.len()
        );
        Ok(())
    }

    async fn similarity_search(
        &self,
        knowledge_base_ids: &[Uuid],
        query_embedding: &[f32],
        top_k: usize,
        score_threshold: Option<f64>,
    ) -> Result<Vec<VectorSearchResult>> {
        if knowledge_base_ids.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = Vector::from(query_embedding.to_vec());
        let rows = sqlx::query(
            r#"
            SELECT id, knowledge_base_id, document_id, content, chunk_metadata,
                   chunk_index, token_count,
                   embedding <=> $1 AS distance
            FROM knowledge_chunks
            WHERE knowledge_base_id = ANY($2)
            ORDER BY embedding <=> $1 ASC
            LIMIT $3
            "#,
        )
        .bind(query_vector)
        .bind(knowledge_base_ids.to_vec())
        .bind(top_k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let mut results = Vec::new();
        for row in rows {
            let distance: f64 = row.get("distance");
            if let Some(threshold) = score_threshold {
                if distance > threshold {
                    continue;
                }
            }
            results.push(VectorSearchResult {
                chunk_id: row.get("id"),
                knowledge_base_id: row.get("knowledge_base_id"),
                document_id: row.get("document_id"),
                score: 1.0 - distance,
                content: row.get("content"),
                metadata: row.get("chunk_metadata"),
                chunk_index: row.get("chunk_index"),
                token_count: row.get("token_count"),
            });
        }

        Ok(results)
    }
}

/// Dimension mismatches and other pgvector failures surface here loudly
fn store_error(err: sqlx::Error) -> KnowledgeError {
    KnowledgeError::VectorStore(err.to_string())
}
