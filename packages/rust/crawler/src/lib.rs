//! Publication listing scrapers.
//!
//! This crate provides:
//! - [`Scraper`]: the capability the scrape stage and single-shot pipeline depend on
//! - [`AcroconScraper`]: adapter for `<dd>`-entry publications pages
//! - [`parse_listing`]: the pure HTML-to-[`Article`] parser behind it

mod acrocon;

use async_trait::async_trait;
use tailor_shared::{Article, Result};

pub use acrocon::{AcroconScraper, DEFAULT_URL, parse_listing};

/// Produce the ordered list of articles on one listing page.
///
/// Implementations are bound to a single URL at construction. Any failure
/// to obtain entries, including an empty page, is a
/// [`TailorError::ScrapeFailure`](tailor_shared::TailorError::ScrapeFailure).
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self) -> Result<Vec<Article>>;
}
