//! Retrieval of RAG context for agents configured with knowledge bases

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::embedding::EmbeddingClient;
use crate::error::{EmbeddingError, KnowledgeError, Result};
use crate::vector_store::VectorStore;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.35;

/// Key under which the retrieved context is attached to the runtime config
pub const RAG_CONTEXT_KEY: &str = "__rag_context__";

/// An agent-like carrier of configuration.
///
/// Implementations expose the effective config (runtime config when present,
/// base config otherwise) and accept a runtime config write. The retriever
/// never mutates the base config in place; it always writes a deep copy, so
/// concurrent requests sharing an agent definition stay isolated.
pub trait ContextAgent {
    fn effective_config(&self) -> &Value;
    fn set_runtime_config(&mut self, config: Value);
}

/// Plain carrier implementing [`ContextAgent`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: Uuid,
    pub config: Value,
    #[serde(default)]
    pub runtime_config: Option<Value>,
}

impl AgentProfile {
    pub fn new(config: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            runtime_config: None,
        }
    }
}

impl ContextAgent for AgentProfile {
    fn effective_config(&self) -> &Value {
        self.runtime_config.as_ref().unwrap_or(&self.config)
    }

    fn set_runtime_config(&mut self, config: Value) {
        self.runtime_config = Some(config);
    }
}

/// One retrieved chunk, in citation order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagReference {
    pub document_id: Option<String>,
    pub knowledge_base_id: Option<String>,
    pub source: String,
    pub chunk_index: i32,
    pub score: f64,
    pub metadata: Value,
}

/// The formatted context block plus structured references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagContext {
    pub text: String,
    pub references: Vec<RagReference>,
}

/// Fetches relevant chunks from the knowledge bases an agent is configured with
pub struct KnowledgeRetriever {
    vector_store: Arc<dyn VectorStore>,
    embedding_client: Arc<EmbeddingClient>,
}

impl KnowledgeRetriever {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedding_client: Arc<EmbeddingClient>) -> Self {
        Self {
            vector_store,
            embedding_client,
        }
    }

    /// Generate context for the agent and query, attach it to the agent's
    /// runtime config, and return it.
    ///
    /// Returns `Ok(None)` when no context applies: no configured bases, a
    /// blank query, an unembeddable query, or no chunk within the score
    /// threshold. Vector store failures propagate; a missing embedding API
    /// key is a configuration fault and propagates too.
    pub async fn apply_context(
        &self,
        agent: &mut dyn ContextAgent,
        query: &str,
    ) -> Result<Option<RagContext>> {
        let config = agent.effective_config().clone();

        let raw_base_ids = config
            .get("knowledge_base_ids")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if raw_base_ids.is_empty() || query.trim().is_empty() {
            return Ok(None);
        }

        let base_ids = normalize_base_ids(&raw_base_ids);
        if base_ids.is_empty() {
            warn!("Agent has invalid knowledge_base_ids, skipping retrieval");
            return Ok(None);
        }

        let embeddings = match self.embedding_client.generate_embeddings([query]).await {
            Ok(embeddings) => embeddings,
            Err(KnowledgeError::Embedding(EmbeddingError::MissingApiKey)) => {
                return Err(EmbeddingError::MissingApiKey.into());
            }
            Err(e) => {
                warn!("Could not generate embeddings for query: {e}");
                return Ok(None);
            }
        };
        let Some(query_embedding) = embeddings.into_iter().next() else {
            warn!("Could not generate embeddings for query");
            return Ok(None);
        };

        let top_k = read_top_k(&config);
        let score_threshold = read_score_threshold(&config);

        let results = self
            .vector_store
            .similarity_search(&base_ids, &query_embedding, top_k, Some(score_threshold))
            .await?;

        if results.is_empty() {
            info!("No knowledge chunks found for query '{query}'");
            return Ok(None);
        }

        let mut context_sections = Vec::new();
        let mut references = Vec::new();

        for (idx, chunk) in results.iter().enumerate() {
            let snippet = chunk.content.trim();
            let metadata = &chunk.metadata;
            let source_label = source_label(metadata);

            context_sections.push(format!("[{}] {snippet}\nSource: {source_label}", idx + 1));
            references.push(RagReference {
                document_id: metadata
                    .get("document_id")
                    .and_then(Value::as_str)
                    .map(String::from),
                knowledge_base_id: metadata
                    .get("knowledge_base_id")
                    .and_then(Value::as_str)
                    .map(String::from),
                source: source_label,
                chunk_index: chunk.chunk_index,
                score: chunk.score,
                metadata: metadata.clone(),
            });
        }

        let context = RagContext {
            text: context_sections.join("\n\n"),
            references,
        };

        // Deep copy: the context must never leak into the shared template
        let mut runtime_config = config;
        if let Some(map) = runtime_config.as_object_mut() {
            map.insert(RAG_CONTEXT_KEY.to_string(), serde_json::to_value(&context)?);
        } else {
            let mut map = serde_json::Map::new();
            map.insert(RAG_CONTEXT_KEY.to_string(), serde_json::to_value(&context)?);
            runtime_config = Value::Object(map);
        }
        agent.set_runtime_config(runtime_config);

        Ok(Some(context))
    }
}

/// Parse configured base ids, dropping entries that are not valid UUIDs
fn normalize_base_ids(raw: &[Value]) -> Vec<Uuid> {
    raw.iter()
        .filter_map(|value| match value {
            Value::String(s) => Uuid::parse_str(s).ok(),
            _ => None,
        })
        .collect()
}

fn read_top_k(config: &Value) -> usize {
    match config.get("rag_top_k") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize).unwrap_or(DEFAULT_TOP_K),
        Some(Value::String(s)) => s.parse().unwrap_or(DEFAULT_TOP_K),
        _ => DEFAULT_TOP_K,
    }
}

/// The threshold is a maximum cosine distance bound, not a similarity floor
fn read_score_threshold(config: &Value) -> f64 {
    match config.get("rag_score_threshold") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_SCORE_THRESHOLD),
        Some(Value::String(s)) => s.parse().unwrap_or(DEFAULT_SCORE_THRESHOLD),
        _ => DEFAULT_SCORE_THRESHOLD,
    }
}

fn source_label(metadata: &Value) -> String {
    for key in ["source_url", "original_filename", "document_id"] {
        if let Some(value) = metadata.get(key).and_then(Value::as_str) {
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    "knowledge-base".to_string()
}
