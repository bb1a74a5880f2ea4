//! Data model for knowledge bases, documents, chunks and ingestion jobs
//!
//! Entities mirror the four `knowledge_*` tables. All cross-entity references
//! are id-based; only the repository resolves ids to full records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::KnowledgeError;

/// Where a document's content comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Upload,
    Text,
    Url,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Text => "text",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = KnowledgeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "upload" => Ok(Self::Upload),
            "text" => Ok(Self::Text),
            "url" => Ok(Self::Url),
            other => Err(KnowledgeError::Validation(format!(
                "Invalid source type: {other}"
            ))),
        }
    }
}

/// Lifecycle status of a document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Ready,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    /// Terminal statuses stamp `processing_finished_at`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = KnowledgeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "ready" => Ok(Self::Ready),
            "error" => Ok(Self::Error),
            other => Err(KnowledgeError::Validation(format!(
                "Invalid document status {other}"
            ))),
        }
    }
}

/// Kind of ingestion job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Ingest,
    Reprocess,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Reprocess => "reprocess",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = KnowledgeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ingest" => Ok(Self::Ingest),
            "reprocess" => Ok(Self::Reprocess),
            other => Err(KnowledgeError::Validation(format!(
                "Invalid job type: {other}"
            ))),
        }
    }
}

/// Lifecycle status of an ingestion job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal statuses stamp `finished_at`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = KnowledgeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(KnowledgeError::Validation(format!(
                "Invalid job status {other}"
            ))),
        }
    }
}

/// A tenant-scoped grouping of documents sharing chunking and embedding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub embedding_model: Option<String>,
    pub chunk_size: i32,
    pub chunk_overlap: i32,
    pub is_active: bool,
    pub config: Value,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single source document inside a knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub client_id: Uuid,
    pub source_type: SourceType,
    pub original_filename: Option<String>,
    pub source_url: Option<String>,
    pub mime_type: Option<String>,
    pub storage_path: Option<String>,
    pub checksum: Option<String>,
    pub content_preview: Option<String>,
    pub extra_metadata: Value,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_finished_at: Option<DateTime<Utc>>,
}

impl KnowledgeDocument {
    /// Raw text carried inline by `text` documents
    pub fn raw_text(&self) -> Option<&str> {
        self.extra_metadata.get("raw_text").and_then(Value::as_str)
    }

    /// Caller-supplied description, when present
    pub fn description(&self) -> Option<&str> {
        self.extra_metadata
            .get("description")
            .and_then(Value::as_str)
    }

    /// Stamp the time of the last successful ingestion
    pub fn set_last_processed_at(&mut self, when: DateTime<Utc>) {
        self.set_metadata_field("last_processed_at", Value::String(when.to_rfc3339()));
    }

    /// Stamp the time a URL document's content was last fetched
    pub fn set_last_fetched_at(&mut self, when: DateTime<Utc>) {
        self.set_metadata_field("last_fetched_at", Value::String(when.to_rfc3339()));
    }

    fn set_metadata_field(&mut self, key: &str, value: Value) {
        if !self.extra_metadata.is_object() {
            self.extra_metadata = Value::Object(serde_json::Map::new());
        }
        if let Some(map) = self.extra_metadata.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }
}

/// A windowed slice of a document's text, with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub token_count: i32,
    pub content: String,
    pub chunk_metadata: Value,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// One entry in a job's ordered log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub status: String,
}

/// A unit of background ingestion work tied to one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeJob {
    pub id: Uuid,
    pub document_id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub attempts: i32,
    pub logs: Vec<JobLogEntry>,
    pub error_message: Option<String>,
    pub job_metadata: Value,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Parameters for creating a knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i32,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: i32,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

fn default_chunk_size() -> i32 {
    512
}

fn default_chunk_overlap() -> i32 {
    128
}

impl KnowledgeBaseCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            language: None,
            embedding_model: None,
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            config: None,
            created_by: None,
        }
    }

    /// Check field bounds before persistence
    pub fn validate(&self) -> Result<(), KnowledgeError> {
        validate_base_fields(
            Some(self.name.as_str()),
            self.description.as_deref(),
            self.language.as_deref(),
            Some(self.chunk_size),
            Some(self.chunk_overlap),
        )
    }
}

/// Partial update for a knowledge base; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub embedding_model: Option<String>,
    pub chunk_size: Option<i32>,
    pub chunk_overlap: Option<i32>,
    pub config: Option<Value>,
    pub updated_by: Option<Uuid>,
}

impl KnowledgeBaseUpdate {
    pub fn validate(&self) -> Result<(), KnowledgeError> {
        validate_base_fields(
            self.name.as_deref(),
            self.description.as_deref(),
            self.language.as_deref(),
            self.chunk_size,
            self.chunk_overlap,
        )
    }
}

fn validate_base_fields(
    name: Option<&str>,
    description: Option<&str>,
    language: Option<&str>,
    chunk_size: Option<i32>,
    chunk_overlap: Option<i32>,
) -> Result<(), KnowledgeError> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(KnowledgeError::Validation(
                "Knowledge base name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > 120 {
            return Err(KnowledgeError::Validation(
                "Knowledge base name exceeds 120 characters".to_string(),
            ));
        }
    }
    if let Some(description) = description {
        if description.chars().count() > 2000 {
            return Err(KnowledgeError::Validation(
                "Description exceeds 2000 characters".to_string(),
            ));
        }
    }
    if let Some(language) = language {
        if language.chars().count() > 16 {
            return Err(KnowledgeError::Validation(
                "Language exceeds 16 characters".to_string(),
            ));
        }
    }
    if let Some(size) = chunk_size {
        if !(64..=4096).contains(&size) {
            return Err(KnowledgeError::Validation(format!(
                "chunk_size must be between 64 and 4096, got {size}"
            )));
        }
    }
    if let Some(overlap) = chunk_overlap {
        if !(0..=2048).contains(&overlap) {
            return Err(KnowledgeError::Validation(format!(
                "chunk_overlap must be between 0 and 2048, got {overlap}"
            )));
        }
    }
    Ok(())
}

/// Parameters for creating a document record
#[derive(Debug, Clone)]
pub struct DocumentCreate {
    pub source_type: SourceType,
    pub original_filename: Option<String>,
    pub source_url: Option<String>,
    pub mime_type: Option<String>,
    pub storage_path: Option<String>,
    pub checksum: Option<String>,
    pub content_preview: Option<String>,
    pub metadata: Option<Value>,
    pub created_by: Option<Uuid>,
}

impl DocumentCreate {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            original_filename: None,
            source_url: None,
            mime_type: None,
            storage_path: None,
            checksum: None,
            content_preview: None,
            metadata: None,
            created_by: None,
        }
    }
}
