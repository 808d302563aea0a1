//! Pipeline stages and orchestration for tailor.
//!
//! The batch stages run in order, each reading the previous stage's output
//! from disk and skipping work that already exists:
//!
//! 1. [`scrape::scrape_all`]: listing → article records + source PDFs
//! 2. [`convert::convert_all`]: source PDFs → cached text
//! 3. [`classify::classify_all`]: cached text → classification ledger
//! 4. [`generate::generate_all`]: ledger + records + text → tailored examples
//!
//! [`pipeline::SingleShotPipeline`] runs fetch → classify → generate for a
//! single URL without touching the on-disk ledgers.

pub mod classify;
pub mod convert;
pub mod frontmatter;
pub mod generate;
pub mod pipeline;
pub mod progress;
pub mod resolver;
pub mod scrape;
pub mod template;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tailor_shared::{Result, TailorError};

pub use progress::{ProgressReporter, SilentProgress};

/// Files in `dir` with the given extension, sorted by file name.
///
/// A missing directory has no files.
pub(crate) fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| TailorError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TailorError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File name of `path` as UTF-8, lossily.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Sleep between rate-limited calls.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
