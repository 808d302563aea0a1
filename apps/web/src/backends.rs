//! Per-request construction of the pipeline's capabilities.

use tailor_agent::{Agent, AnthropicAgent};
use tailor_crawler::{AcroconScraper, Scraper};
use tailor_document::{DocumentSource, HttpDocumentSource};
use tailor_shared::{Result, TailorError};

/// Builds the agent and scraper a request needs.
///
/// The model and URL vary per request, so both are built on demand; the
/// document source is shared.
pub(crate) trait Backends: Send + Sync {
    fn agent(&self, model: &str) -> Result<Box<dyn Agent>>;
    fn scraper(&self, url: &str) -> Result<Box<dyn Scraper>>;
    fn documents(&self) -> &dyn DocumentSource;
}

/// Anthropic, the publications-page scraper and plain HTTP downloads.
pub(crate) struct LiveBackends {
    api_key: Option<String>,
    documents: HttpDocumentSource,
}

impl LiveBackends {
    pub(crate) fn new(api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            api_key,
            documents: HttpDocumentSource::new()?,
        })
    }
}

impl Backends for LiveBackends {
    fn agent(&self, model: &str) -> Result<Box<dyn Agent>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TailorError::config("Anthropic API key not configured"))?;
        Ok(Box::new(AnthropicAgent::new(key, model)?))
    }

    fn scraper(&self, url: &str) -> Result<Box<dyn Scraper>> {
        Ok(Box::new(AcroconScraper::new(url)?))
    }

    fn documents(&self) -> &dyn DocumentSource {
        &self.documents
    }
}
