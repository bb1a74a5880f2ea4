//! On-disk persistence for raw knowledge document artifacts
//!
//! Layout: `<root>/<client_id>/<base_id>/<document_id>/`. Uploads are stored
//! as `source<suffix>`, text artifacts as `text<extension>`.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::Result;

/// Writes raw document artifacts under a deterministic per-tenant layout
#[derive(Debug, Clone)]
pub struct StorageSink {
    root: PathBuf,
}

impl StorageSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding a document's artifacts, created on demand
    pub async fn document_dir(
        &self,
        client_id: Uuid,
        base_id: Uuid,
        document_id: Uuid,
    ) -> Result<PathBuf> {
        let directory = self
            .root
            .join(client_id.to_string())
            .join(base_id.to_string())
            .join(document_id.to_string());
        fs::create_dir_all(&directory).await?;
        Ok(directory)
    }

    /// Save uploaded bytes as `source<suffix>` and return the absolute path
    pub async fn persist_upload(
        &self,
        client_id: Uuid,
        base_id: Uuid,
        document_id: Uuid,
        filename: &str,
        data: &[u8],
    ) -> Result<PathBuf> {
        let directory = self.document_dir(client_id, base_id, document_id).await?;
        let suffix = file_suffix(filename).unwrap_or_else(|| ".bin".to_string());
        let target = directory.join(format!("source{suffix}"));
        fs::write(&target, data).await?;
        Ok(absolute(target))
    }

    /// Save text content as `text<extension>` and return the absolute path
    pub async fn persist_text(
        &self,
        client_id: Uuid,
        base_id: Uuid,
        document_id: Uuid,
        content: &str,
        extension: &str,
    ) -> Result<PathBuf> {
        let directory = self.document_dir(client_id, base_id, document_id).await?;
        let target = directory.join(format!("text{extension}"));
        fs::write(&target, content.as_bytes()).await?;
        Ok(absolute(target))
    }
}

/// Extract the dotted suffix from a filename, e.g. `report.pdf` -> `.pdf`
fn file_suffix(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}
