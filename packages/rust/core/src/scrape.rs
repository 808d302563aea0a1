//! Scrape stage: listing page → article records + downloaded source documents.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, instrument, warn};

use tailor_crawler::Scraper;
use tailor_document::{DocumentSource, SOURCE_EXTENSION};
use tailor_shared::{Article, Result, TailorError, write_atomic};

use crate::pause;
use crate::progress::ProgressReporter;

/// Where the scrape stage writes and how fast it downloads.
#[derive(Debug, Clone)]
pub struct ScrapeAllConfig {
    /// One `<key>.json` record per article.
    pub articles_dir: PathBuf,
    /// One `<key>.pdf` per article with a document URL.
    pub source_dir: PathBuf,
    /// Pause after each item that attempted a download.
    pub download_delay: Duration,
}

/// Summary of a completed scrape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    /// Articles returned by the scraper.
    pub found: usize,
    /// Records written by this run.
    pub records_written: usize,
    /// Records that already existed and were left alone.
    pub records_existing: usize,
    /// Source documents downloaded by this run.
    pub downloads: usize,
    /// Source documents already on disk.
    pub downloads_skipped: usize,
    /// Per-item failures (key, message).
    pub failures: Vec<(String, String)>,
}

/// Scrape the listing and persist every article that is not yet on disk.
///
/// A scraper failure is returned as-is. Per-item write or download failures
/// are recorded in the report and the batch continues; a failed download
/// leaves the metadata record in place. An entry whose key repeats an
/// earlier entry of the same listing is reported as a failure and skipped.
#[instrument(skip_all, fields(articles_dir = %config.articles_dir.display()))]
pub async fn scrape_all(
    scraper: &dyn Scraper,
    source: &dyn DocumentSource,
    config: &ScrapeAllConfig,
    progress: &dyn ProgressReporter,
) -> Result<ScrapeReport> {
    progress.phase("Scraping listing");
    let articles = scraper.scrape().await?;

    let mut report = ScrapeReport {
        found: articles.len(),
        ..Default::default()
    };
    info!(found = report.found, "articles scraped");

    progress.phase("Saving articles");
    let total = articles.len();
    let mut seen = HashSet::with_capacity(total);
    for (i, article) in articles.iter().enumerate() {
        let key = article.key();
        progress.item(i + 1, total, &key);

        if !seen.insert(key.clone()) {
            let err = TailorError::validation(format!(
                "key '{key}' repeats an earlier entry, skipping '{}'",
                article.title
            ));
            warn!(%key, title = %article.title, "duplicate article key");
            progress.item_failed(&key, &err);
            report.failures.push((key, err.to_string()));
            continue;
        }

        match persist_record(article, &config.articles_dir.join(format!("{key}.json"))) {
            Ok(true) => report.records_written += 1,
            Ok(false) => report.records_existing += 1,
            Err(e) => {
                warn!(%key, error = %e, "failed to save article record");
                progress.item_failed(&key, &e);
                report.failures.push((key.clone(), e.to_string()));
            }
        }

        let Some(url) = article.source_url.as_deref() else {
            continue;
        };

        let target = config.source_dir.join(format!("{key}.{SOURCE_EXTENSION}"));
        if target.exists() {
            report.downloads_skipped += 1;
            continue;
        }

        match download_to(source, url, &target).await {
            Ok(()) => report.downloads += 1,
            Err(e) => {
                warn!(%key, %url, error = %e, "download failed");
                progress.item_failed(&key, &e);
                report.failures.push((key, e.to_string()));
            }
        }

        if i + 1 < total {
            pause(config.download_delay).await;
        }
    }

    info!(
        written = report.records_written,
        existing = report.records_existing,
        downloads = report.downloads,
        skipped = report.downloads_skipped,
        failures = report.failures.len(),
        "scrape completed"
    );
    progress.done(&format!(
        "{} articles, {} new records, {} downloads",
        report.found, report.records_written, report.downloads
    ));

    Ok(report)
}

/// Write the record unless it exists. Returns whether it was written.
fn persist_record(article: &Article, path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    article.save(path)?;
    Ok(true)
}

async fn download_to(source: &dyn DocumentSource, url: &str, target: &Path) -> Result<()> {
    let bytes = source.download(url).await?;
    write_atomic(target, bytes)
}
