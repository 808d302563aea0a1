//! Core domain types shared by every pipeline stage.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TailorError};

/// Title used for articles synthesized from a bare document URL.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Author used for articles synthesized from a bare document URL.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
/// Venue used for articles synthesized from a bare document URL.
pub const UNKNOWN_VENUE: &str = "Unknown Venue";

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// Structured metadata for a single publication.
///
/// Records are written once by the scrape stage and never mutated; later
/// stages re-read them from `<articles_dir>/<key>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Publication title.
    pub title: String,
    /// Authors in display order.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Venue heading the entry was listed under.
    #[serde(default)]
    pub venue: String,
    /// Location of the retrievable primary document (usually a PDF).
    #[serde(rename = "pdf_url", default)]
    pub source_url: Option<String>,
    /// Labelled links in document order.
    #[serde(default)]
    pub links: IndexMap<String, String>,
}

impl Article {
    /// Minimal record for a document URL supplied without a listing page.
    pub fn stub(source_url: impl Into<String>) -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            authors: vec![UNKNOWN_AUTHOR.to_string()],
            venue: UNKNOWN_VENUE.to_string(),
            source_url: Some(source_url.into()),
            links: IndexMap::new(),
        }
    }

    /// The filesystem key this record is stored under.
    pub fn key(&self) -> String {
        stable_key(self)
    }

    /// Read a record from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TailorError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            TailorError::parse(format!("invalid article record {}: {e}", path.display()))
        })
    }

    /// Write the record as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TailorError::parse(format!("failed to serialize article: {e}")))?;
        crate::fs::write_atomic(path, json)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The model's answer for one paper, before it is tied to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_real_world_application: bool,
    #[serde(default)]
    pub reason: String,
}

impl Verdict {
    /// A negative verdict carrying an explanation.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_real_world_application: false,
            reason: reason.into(),
        }
    }
}

/// One ledger entry: a verdict for a cached text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Text-cache filename, e.g. `paper.md`.
    pub file: String,
    pub is_real_world_application: bool,
    #[serde(default)]
    pub reason: String,
}

impl ClassificationResult {
    pub fn new(file: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            file: file.into(),
            is_real_world_application: verdict.is_real_world_application,
            reason: verdict.reason,
        }
    }

    /// Stem of the text-cache file, used to find the article record.
    pub fn stem(&self) -> &str {
        file_stem(&self.file)
    }
}

// ---------------------------------------------------------------------------
// Stable keys
// ---------------------------------------------------------------------------

/// Strip the final extension from a file name (`paper.v2.pdf` → `paper.v2`).
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Stem of the last path segment of a URL, if there is a non-empty one.
pub fn url_file_stem(url: &str) -> Option<String> {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    }?;

    let stem = file_stem(&segment);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Generate a filesystem-safe slug from a title.
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.chars().take(80).collect::<String>().trim_end_matches('-').to_string()
    }
}

/// Key shared by an article's metadata record, source file, text cache and
/// generated example: the document stem, or a title slug without one.
pub fn stable_key(article: &Article) -> String {
    article
        .source_url
        .as_deref()
        .and_then(url_file_stem)
        .unwrap_or_else(|| slugify(&article.title))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        let mut links = IndexMap::new();
        links.insert("PDF".to_string(), "https://example.org/pubs/fleet.pdf".to_string());
        links.insert("DOI".to_string(), "https://doi.org/10.1145/1".to_string());
        Article {
            title: "Optimisation for a Fleet of Healthcare Vehicles".into(),
            authors: vec!["Sarah Thomson".into(), "Markus Wagner".into()],
            venue: "GECCO 2024".into(),
            source_url: Some("https://example.org/pubs/fleet.pdf".into()),
            links,
        }
    }

    #[test]
    fn article_serializes_source_url_as_pdf_url() {
        let json = serde_json::to_string(&sample_article()).expect("serialize");
        assert!(json.contains(r#""pdf_url":"https://example.org/pubs/fleet.pdf""#));
        assert!(!json.contains("source_url"));
    }

    #[test]
    fn article_links_keep_document_order() {
        let json = r#"{"title":"T","authors":[],"venue":"","pdf_url":null,
            "links":{"Zeta":"https://z","Alpha":"https://a","Mid":"https://m"}}"#;
        let article: Article = serde_json::from_str(json).expect("deserialize");
        let labels: Vec<&str> = article.links.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["Zeta", "Alpha", "Mid"]);
        assert!(article.source_url.is_none());
    }

    #[test]
    fn article_save_and_load() {
        let dir = std::env::temp_dir().join(format!("tailor-article-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join("fleet.json");

        let article = sample_article();
        article.save(&path).expect("save");
        let loaded = Article::load(&path).expect("load");
        assert_eq!(loaded, article);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn stub_uses_sentinels() {
        let stub = Article::stub("https://example.org/x.pdf");
        assert_eq!(stub.title, UNKNOWN_TITLE);
        assert_eq!(stub.authors, vec![UNKNOWN_AUTHOR.to_string()]);
        assert_eq!(stub.venue, UNKNOWN_VENUE);
        assert!(stub.links.is_empty());
    }

    #[test]
    fn stems_from_urls() {
        assert_eq!(
            url_file_stem("https://example.org/pubs/fleet.pdf").as_deref(),
            Some("fleet")
        );
        assert_eq!(
            url_file_stem("https://example.org/pubs/fleet.pdf?download=1").as_deref(),
            Some("fleet")
        );
        assert_eq!(url_file_stem("pubs/2024-gecco.final.pdf").as_deref(), Some("2024-gecco.final"));
        assert_eq!(url_file_stem("https://example.org/pubs/"), None);
    }

    #[test]
    fn file_stem_handles_dotfiles_and_plain_names() {
        assert_eq!(file_stem("paper.md"), "paper");
        assert_eq!(file_stem("paper"), "paper");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn stable_key_prefers_document_stem() {
        let article = sample_article();
        assert_eq!(stable_key(&article), "fleet");

        let mut no_pdf = article.clone();
        no_pdf.source_url = None;
        assert_eq!(
            stable_key(&no_pdf),
            "optimisation-for-a-fleet-of-healthcare-vehicles"
        );
    }

    #[test]
    fn slugify_never_empty() {
        assert_eq!(slugify("  ?!  "), "untitled");
        assert_eq!(slugify("Évolution: A Study"), "évolution-a-study");
    }

    #[test]
    fn classification_result_from_verdict() {
        let result = ClassificationResult::new("fleet.md", Verdict::rejected("survey"));
        assert_eq!(result.stem(), "fleet");
        assert!(!result.is_real_world_application);
        assert_eq!(result.reason, "survey");
    }
}
