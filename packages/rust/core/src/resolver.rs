//! Text resolution: cached conversion first, network fetch second.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use tailor_document::DocumentSource;
use tailor_shared::{Article, Result, TailorError, url_file_stem};

/// Where the cached text for `article` would live in `cache_dir`.
///
/// Derived from the document URL's file stem, so articles without a
/// document URL have no cache location.
pub fn cached_text_path(article: &Article, cache_dir: &Path) -> Option<PathBuf> {
    let stem = article.source_url.as_deref().and_then(url_file_stem)?;
    Some(cache_dir.join(format!("{stem}.md")))
}

/// Return the full text of `article`.
///
/// A cache hit never touches the network. A miss fetches and extracts the
/// document once. Text that cannot be obtained is a
/// [`TailorError::Resolution`], never an empty string.
#[instrument(skip_all, fields(title = %article.title))]
pub async fn resolve(
    article: &Article,
    cache_dir: Option<&Path>,
    source: &dyn DocumentSource,
) -> Result<String> {
    if let Some(cached) = cache_dir.and_then(|dir| cached_text_path(article, dir)) {
        if cached.is_file() {
            debug!(path = %cached.display(), "using cached text");
            return std::fs::read_to_string(&cached).map_err(|e| TailorError::io(&cached, e));
        }
    }

    let Some(url) = article.source_url.as_deref() else {
        return Err(TailorError::resolution(format!(
            "'{}' has no document URL and no cached text",
            article.title
        )));
    };

    debug!(%url, "cache miss, fetching document");
    source
        .fetch_text(url)
        .await
        .map_err(|e| TailorError::resolution(format!("{url}: {e}")))
}
