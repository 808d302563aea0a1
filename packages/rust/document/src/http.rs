//! HTTP-backed [`DocumentSource`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use tailor_shared::{Result, TailorError};

use crate::DocumentSource;
use crate::pdf::extract_pdf_text;

/// User-Agent string for document downloads.
const USER_AGENT: &str = concat!("tailor/", env!("CARGO_PKG_VERSION"));

/// Default timeout in seconds for a document download.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum response size we accept (50 MB).
const MAX_DOCUMENT_SIZE: u64 = 50 * 1024 * 1024;

/// Downloads documents over HTTP and extracts PDF text.
#[derive(Debug, Clone)]
pub struct HttpDocumentSource {
    client: Client,
    max_size: u64,
}

impl HttpDocumentSource {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| TailorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_size: MAX_DOCUMENT_SIZE,
        })
    }

    /// Reject documents larger than `bytes`.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    fn too_large(&self, url: &str, len: u64) -> TailorError {
        TailorError::validation(format!(
            "{url}: document too large ({len} bytes, max {})",
            self.max_size
        ))
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TailorError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TailorError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_size {
                return Err(self.too_large(url, len));
            }
        }

        // Chunked responses carry no length up front.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TailorError::Network(format!("{url}: failed to read body: {e}")))?
        {
            let len = (bytes.len() + chunk.len()) as u64;
            if len > self.max_size {
                return Err(self.too_large(url, len));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(bytes = bytes.len(), "document downloaded");
        Ok(bytes)
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        extract_pdf_text(bytes)
    }
}
