//! Knowledge Ingestion and Retrieval Core
//!
//! A multi-tenant RAG subsystem core that integrates:
//! - Document ingestion from uploads, pasted text, and fetched URLs
//! - Word-boundary chunking with overlap and batch embedding generation
//! - pgvector-backed similarity search scoped by tenant and knowledge base
//! - A retriever that materializes context payloads for downstream agents
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use knowledge_core::{
//!     config::KnowledgeConfig,
//!     embedding::EmbeddingClient,
//!     extract::TextExtractor,
//!     ingestion::IngestionPipeline,
//!     repository::KnowledgeRepository,
//!     scheduler::TokioJobScheduler,
//!     service::KnowledgeService,
//!     storage::StorageSink,
//!     vector_store::create_vector_store,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = KnowledgeConfig::from_env();
//!     config.validate()?;
//!
//!     let database_url = config.vector_store.database_url.clone().unwrap();
//!     let pool = sqlx::postgres::PgPool::connect(&database_url).await?;
//!     KnowledgeRepository::ensure_schema(&pool, config.embedding.dimensions).await?;
//!
//!     let store = create_vector_store(&config.vector_store, pool.clone())?;
//!     let repository = Arc::new(KnowledgeRepository::new(pool, store));
//!     let storage = StorageSink::new(&config.storage.root);
//!
//!     let pipeline = Arc::new(IngestionPipeline::new(
//!         Arc::clone(&repository),
//!         TextExtractor::new(storage.clone())?,
//!         EmbeddingClient::new(config.embedding.clone())?,
//!         config.chunking.clone(),
//!     ));
//!     let scheduler = Arc::new(TokioJobScheduler::new(pipeline));
//!     let service = KnowledgeService::new(repository, storage, scheduler, config.storage);
//!
//!     let _ = service;
//!     Ok(())
//! }
//! ```

pub mod chunker;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingestion;
pub mod model;
pub mod repository;
pub mod retriever;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod vector_store;

// Re-export main types
pub use chunker::ContentChunker;
pub use config::{
    ChunkingDefaults, EmbeddingConfig, KnowledgeConfig, StorageConfig, VectorStoreConfig,
};
pub use embedding::EmbeddingClient;
pub use error::{EmbeddingError, ExtractionError, KnowledgeError, Result};
pub use extract::TextExtractor;
pub use ingestion::IngestionPipeline;
pub use model::{
    DocumentCreate, DocumentStatus, JobLogEntry, JobStatus, JobType, KnowledgeBase,
    KnowledgeBaseCreate, KnowledgeBaseUpdate, KnowledgeChunk, KnowledgeDocument, KnowledgeJob,
    SourceType,
};
pub use repository::{ChunkDraft, KnowledgeRepository};
pub use retriever::{
    AgentProfile, ContextAgent, KnowledgeRetriever, RagContext, RagReference,
};
pub use scheduler::{JobScheduler, TokioJobScheduler};
pub use service::KnowledgeService;
pub use storage::StorageSink;
pub use vector_store::{
    create_vector_store, PgVectorStore, VectorChunkPayload, VectorSearchResult, VectorStore,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
