//! Configuration management for the knowledge core

use serde::{Deserialize, Serialize};

/// Main configuration for the knowledge core
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeConfig {
    /// Vector store configuration
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking defaults applied when a knowledge base leaves them unset
    #[serde(default)]
    pub chunking: ChunkingDefaults,

    /// On-disk artifact storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Vector store provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Provider name ("pgvector")
    pub provider: String,

    /// PostgreSQL connection string
    pub database_url: Option<String>,
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,

    /// Base URL of the embedding API (OpenAI-compatible)
    pub base_url: Option<String>,

    /// API key for the embedding service
    pub api_key: Option<String>,

    /// Embedding vector dimension
    pub dimensions: usize,

    /// Request timeout in seconds
    pub timeout: u64,
}

/// Default chunking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingDefaults {
    /// Maximum words per chunk
    pub max_chunk_tokens: usize,

    /// Words of overlap between adjacent chunks
    pub chunk_overlap: usize,
}

/// Storage sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for raw document artifacts
    pub root: String,

    /// Maximum upload size in megabytes
    pub max_upload_size_mb: usize,

    /// Allowed MIME types for uploads; empty accepts anything
    #[serde(default)]
    pub allowed_mime_types: Vec<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: "pgvector".to_string(),
            database_url: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            base_url: None,
            api_key: None,
            dimensions: 1536,
            timeout: 30,
        }
    }
}

impl Default for ChunkingDefaults {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 512,
            chunk_overlap: 128,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "static/knowledge".to_string(),
            max_upload_size_mb: 25,
            allowed_mime_types: vec![
                "application/pdf".to_string(),
                "text/plain".to_string(),
                "text/markdown".to_string(),
                "application/msword".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
            ],
        }
    }
}

impl StorageConfig {
    /// Maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Check whether a MIME type is accepted for uploads
    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        if self.allowed_mime_types.is_empty() {
            return true;
        }
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.trim() == mime_type)
    }
}

impl KnowledgeConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config = match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yml::from_str(&content)?,
            _ => return Err(anyhow::anyhow!("Unsupported config file format")),
        };
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(provider) = std::env::var("VECTOR_STORE_PROVIDER") {
            config.vector_store.provider = provider;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.vector_store.database_url = Some(url);
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(base_url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = Some(base_url);
        }
        if let Ok(api_key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(api_key);
        }
        if let Some(dimensions) = read_env_number("EMBEDDING_DIMENSIONS") {
            config.embedding.dimensions = dimensions;
        }
        if let Some(max_tokens) = read_env_number("MAX_CHUNK_TOKENS") {
            config.chunking.max_chunk_tokens = max_tokens;
        }
        if let Some(overlap) = read_env_number("CHUNK_OVERLAP") {
            config.chunking.chunk_overlap = overlap;
        }
        if let Ok(path) = std::env::var("KNOWLEDGE_STORAGE_PATH") {
            config.storage.root = path;
        }
        if let Some(max_mb) = read_env_number("MAX_UPLOAD_SIZE_MB") {
            config.storage.max_upload_size_mb = max_mb;
        }
        if let Ok(mime_types) = std::env::var("KNOWLEDGE_ALLOWED_MIME_TYPES") {
            config.storage.allowed_mime_types = mime_types
                .split(',')
                .map(|mime| mime.trim().to_string())
                .filter(|mime| !mime.is_empty())
                .collect();
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.vector_store.provider.to_lowercase() != "pgvector" {
            return Err(anyhow::anyhow!(
                "Unsupported vector store provider: {}",
                self.vector_store.provider
            ));
        }

        if self.embedding.model.is_empty() {
            return Err(anyhow::anyhow!("Embedding model name cannot be empty"));
        }

        if self.embedding.dimensions == 0 {
            return Err(anyhow::anyhow!(
                "Embedding dimension must be greater than 0"
            ));
        }

        if self.chunking.max_chunk_tokens < 64 {
            return Err(anyhow::anyhow!("Chunk size must be at least 64 words"));
        }

        if self.storage.root.is_empty() {
            return Err(anyhow::anyhow!("Knowledge storage path cannot be empty"));
        }

        Ok(())
    }
}

fn read_env_number(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KnowledgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vector_store.provider, "pgvector");
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.chunking.max_chunk_tokens, 512);
        assert_eq!(config.chunking.chunk_overlap, 128);
        assert_eq!(config.storage.max_upload_size_mb, 25);
    }

    #[test]
    fn test_config_validation() {
        let mut config = KnowledgeConfig::default();
        assert!(config.validate().is_ok());

        config.vector_store.provider = "pinecone".to_string();
        assert!(config.validate().is_err());

        config = KnowledgeConfig::default();
        config.embedding.model = String::new();
        assert!(config.validate().is_err());

        config = KnowledgeConfig::default();
        config.chunking.max_chunk_tokens = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mime_allowlist() {
        let mut storage = StorageConfig::default();
        assert!(storage.is_mime_allowed("application/pdf"));
        assert!(!storage.is_mime_allowed("image/png"));

        storage.allowed_mime_types.clear();
        assert!(storage.is_mime_allowed("image/png"));
    }

    #[test]
    fn test_max_upload_bytes() {
        let storage = StorageConfig {
            max_upload_size_mb: 2,
            ..Default::default()
        };
        assert_eq!(storage.max_upload_bytes(), 2 * 1024 * 1024);
    }
}
