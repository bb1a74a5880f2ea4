//! Client for the external embedding service
//!
//! Speaks the OpenAI-compatible `POST /embeddings` shape: a model name plus a
//! batch of input strings, answered by `{ data: [{ embedding: [...] }, ...] }`
//! aligned by position.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Batched embedding generation against an OpenAI-compatible endpoint
pub struct EmbeddingClient {
    config: EmbeddingConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Configured embedding dimension
    pub fn dimension(&self) -> usize {
        self.config.dimensions
    }

    /// Generate embeddings for a batch of texts, aligned by position.
    ///
    /// Empty and whitespace-only entries are stripped before the call; an
    /// entirely blank batch short-circuits to an empty result without
    /// touching the network. A count mismatch from the API is logged and
    /// whatever vectors were returned are passed through.
    pub async fn generate_embeddings<I, S>(&self, texts: I) -> Result<Vec<Vec<f32>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text_list: Vec<String> = texts
            .into_iter()
            .map(|text| text.as_ref().to_string())
            .filter(|text| !text.trim().is_empty())
            .collect();
        if text_list.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(EmbeddingError::MissingApiKey)?;

        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');

        let request = EmbeddingRequest {
            model: self.config.model.as_str(),
            input: &text_list,
        };

        let response = self
            .http_client
            .post(format!("{base_url}/embeddings"))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::Service(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Service(format!(
                "embedding API returned {status}: {body}"
            ))
            .into());
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Service(format!("malformed response: {e}")))?;

        if parsed.data.len() != text_list.len() {
            warn!(
                "Embedding API returned mismatch: {} vs {}",
                parsed.data.len(),
                text_list.len()
            );
        }

        Ok(parsed
            .data
            .into_iter()
            .map(|item| item.embedding)
            .filter(|vector| !vector.is_empty())
            .collect())
    }
}
