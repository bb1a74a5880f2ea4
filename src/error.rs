//! Error handling for the knowledge core

use thiserror::Error;

/// Result type alias for the knowledge core
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Main error type for the knowledge core
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding API key not configured")]
    MissingApiKey,

    #[error("Embedding service failed: {0}")]
    Service(String),

    #[error("Embedding generation mismatch")]
    CountMismatch,
}

/// Errors related to document text extraction
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported source type {0}")]
    UnsupportedSourceType(String),

    #[error("Upload does not have a storage path")]
    MissingStoragePath,

    #[error("Document is missing source_url")]
    MissingSourceUrl,

    #[error("Document content is empty")]
    EmptyContent,

    #[error("Failed to parse document: {0}")]
    ParseFailed(String),
}

impl KnowledgeError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KnowledgeError::Http(_)
                | KnowledgeError::Fetch(_)
                | KnowledgeError::Embedding(EmbeddingError::Service(_))
        )
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            KnowledgeError::Validation(_) => "validation",
            KnowledgeError::NotFound(_) => "not_found",
            KnowledgeError::Embedding(_) => "embedding",
            KnowledgeError::Extraction(_) => "extraction",
            KnowledgeError::VectorStore(_) => "vector_store",
            KnowledgeError::Fetch(_) => "fetch",
            KnowledgeError::Database(_) => "database",
            KnowledgeError::Io(_) => "io",
            KnowledgeError::Serialization(_) => "serialization",
            KnowledgeError::Http(_) => "http",
            KnowledgeError::Config(_) => "config",
            KnowledgeError::Generic(_) => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let service_error = KnowledgeError::Embedding(EmbeddingError::Service("503".to_string()));
        assert!(service_error.is_retryable());

        let validation_error = KnowledgeError::Validation("bad chunk_size".to_string());
        assert!(!validation_error.is_retryable());

        let config_error = KnowledgeError::Embedding(EmbeddingError::MissingApiKey);
        assert!(!config_error.is_retryable());
    }

    #[test]
    fn test_error_category() {
        let embedding_error = KnowledgeError::Embedding(EmbeddingError::MissingApiKey);
        assert_eq!(embedding_error.category(), "embedding");

        let extraction_error = KnowledgeError::Extraction(ExtractionError::EmptyContent);
        assert_eq!(extraction_error.category(), "extraction");
    }

    #[test]
    fn test_extraction_error_messages() {
        // Messages recorded on failed documents must stay stable
        assert_eq!(
            ExtractionError::EmptyContent.to_string(),
            "Document content is empty"
        );
        assert_eq!(
            ExtractionError::UnsupportedSourceType("rss".to_string()).to_string(),
            "Unsupported source type rss"
        );
    }
}
