//! Text extraction for the supported document source types
//!
//! Uploads branch on file suffix and MIME type (PDF, DOCX, plain text with a
//! Latin-1 fallback). Text documents carry their content inline. URL documents
//! are fetched at ingestion time and reduced to visible text.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use quick_xml::events::Event;
use scraper::{Html, Node};
use tracing::debug;

use crate::error::{ExtractionError, KnowledgeError, Result};
use crate::model::{KnowledgeDocument, SourceType};
use crate::storage::StorageSink;

/// Timeout for URL document fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Extracts plain text from knowledge documents
pub struct TextExtractor {
    storage: StorageSink,
    http_client: reqwest::Client,
}

impl TextExtractor {
    pub fn new(storage: StorageSink) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            storage,
            http_client,
        })
    }

    /// Extract the document's text, dispatching on its source type.
    ///
    /// URL documents persist the fetched page as a `.url.txt` artifact and
    /// stamp `last_fetched_at` on the document metadata.
    pub async fn extract(&self, document: &mut KnowledgeDocument) -> Result<String> {
        match document.source_type {
            SourceType::Upload => {
                let storage_path = document
                    .storage_path
                    .as_deref()
                    .ok_or(ExtractionError::MissingStoragePath)?;
                let mime_type = document.mime_type.as_deref().unwrap_or("");
                extract_from_file(Path::new(storage_path), mime_type).await
            }
            SourceType::Text => Ok(document.raw_text().unwrap_or("").to_string()),
            SourceType::Url => {
                let url = document
                    .source_url
                    .as_deref()
                    .ok_or(ExtractionError::MissingSourceUrl)?;
                let content = self.fetch_url(url).await?;
                self.storage
                    .persist_text(
                        document.client_id,
                        document.knowledge_base_id,
                        document.id,
                        &content,
                        ".url.txt",
                    )
                    .await?;
                document.set_last_fetched_at(Utc::now());
                Ok(content)
            }
        }
    }

    /// Fetch a URL and reduce the response to visible text
    async fn fetch_url(&self, url: &str) -> Result<String> {
        debug!("Fetching URL document content from {}", url);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| KnowledgeError::Fetch(format!("Failed to fetch {url}: {e}")))?
            .error_for_status()
            .map_err(|e| KnowledgeError::Fetch(format!("Fetch of {url} failed: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| KnowledgeError::Fetch(format!("Failed to read body of {url}: {e}")))?;

        Ok(html_to_text(&html))
    }
}

/// Read a file and extract text based on suffix and MIME type
async fn extract_from_file(path: &Path, mime_type: &str) -> Result<String> {
    let suffix = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    if suffix == "pdf" || mime_type.contains("pdf") {
        return extract_pdf(path);
    }

    if suffix == "docx" || mime_type.contains("wordprocessingml") {
        return extract_docx(path);
    }

    let bytes = tokio::fs::read(path).await?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        // Latin-1 maps every byte to its code point, so this cannot fail
        Err(err) => Ok(err
            .into_bytes()
            .iter()
            .map(|&byte| byte as char)
            .collect()),
    }
}

/// Concatenate per-page PDF text; pages that fail to extract are skipped
fn extract_pdf(path: &Path) -> Result<String> {
    let document = lopdf::Document::load(path)
        .map_err(|e| ExtractionError::ParseFailed(format!("PDF extraction failed: {e}")))?;

    let mut pages = Vec::new();
    for &page_number in document.get_pages().keys() {
        let mut page_text = String::new();
        let extracted = {
            let mut output = pdf_extract::PlainTextOutput::new(&mut page_text);
            pdf_extract::output_doc_page(&document, &mut output, page_number)
        };
        match extracted {
            Ok(()) => pages.push(page_text),
            Err(e) => debug!("Skipping unreadable PDF page {page_number}: {e}"),
        }
    }

    Ok(pages.join("\n"))
}

/// Concatenate the paragraph texts of a DOCX `word/document.xml`
fn extract_docx(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ExtractionError::ParseFailed(format!("Invalid DOCX archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::ParseFailed(format!("DOCX missing document.xml: {e}")))?
        .read_to_string(&mut xml)?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) if start.local_name().as_ref() == b"t" => {
                in_text_run = true;
            }
            Ok(Event::End(end)) => match end.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text_run => {
                let unescaped = text.unescape().map_err(|e| {
                    ExtractionError::ParseFailed(format!("DOCX text decode failed: {e}"))
                })?;
                current.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(
                    ExtractionError::ParseFailed(format!("DOCX parse failed: {e}")).into(),
                )
            }
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n"))
}

/// Extract visible text from HTML, dropping `<script>` and `<style>` subtrees
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut sections = Vec::new();
    collect_visible_text(document.tree.root(), &mut sections);
    sections.join("\n")
}

fn collect_visible_text(node: ego_tree::NodeRef<'_, Node>, out: &mut Vec<String>) {
    if let Node::Element(element) = node.value() {
        let name = element.name();
        if name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style") {
            return;
        }
    }
    if let Node::Text(text) = node.value() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }
    for child in node.children() {
        collect_visible_text(child, out);
    }
}
