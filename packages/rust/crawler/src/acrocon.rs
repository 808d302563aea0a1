//! Scraper for `<dd>`-entry publication listings (acrocon.com style).
//!
//! Each `<dd>` is one publication: an `<h4>` venue, a bold `<span>` title,
//! an italic `<span>` author list and any number of labelled anchors.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use tailor_shared::{Article, Result, TailorError};

use crate::Scraper;

/// Listing scraped when no URL is configured.
pub const DEFAULT_URL: &str = "https://www.acrocon.com/~wagner/publications.html";

/// User-Agent string for listing requests.
const USER_AGENT: &str = concat!("tailor/", env!("CARGO_PKG_VERSION"));

static SUPERVISOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*Supervisors?:").unwrap());

static AUTHOR_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*and\s+|,\s*|\s+and\s+").unwrap());

// ---------------------------------------------------------------------------
// AcroconScraper
// ---------------------------------------------------------------------------

/// Fetches one publications page and parses its entries.
#[derive(Debug, Clone)]
pub struct AcroconScraper {
    url: Url,
    client: Client,
}

impl AcroconScraper {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| TailorError::validation(format!("invalid listing URL {url}: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TailorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn fetch_listing(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url.as_str())
            .send()
            .await
            .map_err(|e| TailorError::ScrapeFailure(format!("{}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TailorError::ScrapeFailure(format!(
                "{}: HTTP {status}",
                self.url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| TailorError::ScrapeFailure(format!("{}: failed to read body: {e}", self.url)))
    }
}

#[async_trait]
impl Scraper for AcroconScraper {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn scrape(&self) -> Result<Vec<Article>> {
        let html = self.fetch_listing().await?;
        let articles = parse_listing(&html, &self.url);

        if articles.is_empty() {
            return Err(TailorError::ScrapeFailure(format!(
                "{}: no publication entries found",
                self.url
            )));
        }

        info!(articles = articles.len(), "listing scraped");
        Ok(articles)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse every titled `<dd>` entry of a listing page, in document order.
///
/// Relative hrefs are resolved against `base`.
pub fn parse_listing(html: &str, base: &Url) -> Vec<Article> {
    let doc = Html::parse_document(html);
    let dd_sel = Selector::parse("dd").unwrap();

    let mut articles = Vec::new();
    for dd in doc.select(&dd_sel) {
        match parse_entry(dd, base) {
            Some(article) => articles.push(article),
            None => debug!("skipping entry without a title"),
        }
    }
    articles
}

fn parse_entry(dd: ElementRef<'_>, base: &Url) -> Option<Article> {
    let h4_sel = Selector::parse("h4").unwrap();
    let span_sel = Selector::parse("span[style]").unwrap();
    let anchor_sel = Selector::parse("a[href]").unwrap();

    let title = styled_span(dd, &span_sel, "font-weight")
        .map(element_text)
        .unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let venue = dd
        .select(&h4_sel)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let authors = styled_span(dd, &span_sel, "font-style")
        .map(|span| split_authors(&element_text(span)))
        .unwrap_or_default();

    let mut links = IndexMap::new();
    let mut source_url = None;
    for anchor in dd.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let full_url = base
            .join(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_string());

        let label = element_text(anchor);
        if !label.is_empty() {
            links.insert(label, full_url.clone());
        }
        if href.to_lowercase().ends_with(".pdf") {
            source_url = Some(full_url);
        }
    }

    Some(Article {
        title,
        authors,
        venue,
        source_url,
        links,
    })
}

/// First `<span>` whose inline style mentions `property`.
fn styled_span<'a>(dd: ElementRef<'a>, sel: &Selector, property: &str) -> Option<ElementRef<'a>> {
    dd.select(sel).find(|span| {
        span.value()
            .attr("style")
            .is_some_and(|style| style.contains(property))
    })
}

/// Element text with whitespace runs collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split an author line, dropping any trailing supervisor list.
fn split_authors(text: &str) -> Vec<String> {
    let authors = SUPERVISOR_RE.split(text).next().unwrap_or_default();
    AUTHOR_SPLIT_RE
        .split(authors)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}
