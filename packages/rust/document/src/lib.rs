//! Source-document retrieval and text extraction.
//!
//! This crate provides:
//! - [`DocumentSource`]: the download + extract capability the pipeline depends on
//! - [`HttpDocumentSource`]: reqwest download with PDF text extraction
//! - [`extract_pdf_text`]: byte-to-text extraction for PDFs
//! - [`is_document_url`]: recognizes direct links to documents

mod http;
mod pdf;

use async_trait::async_trait;
use tailor_shared::Result;
use url::Url;

pub use http::HttpDocumentSource;
pub use pdf::extract_pdf_text;

/// File extensions treated as directly retrievable documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Extension used for downloaded source documents on disk.
pub const SOURCE_EXTENSION: &str = "pdf";

/// Download raw documents and turn their bytes into text.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the raw bytes at `url`.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;

    /// Extract plain text from document bytes.
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;

    /// Download and extract in one step.
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.download(url).await?;
        self.extract_text(&bytes)
    }
}

/// Whether `url` points straight at a document (by path extension).
pub fn is_document_url(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    let path = path.to_ascii_lowercase();

    DOCUMENT_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}
