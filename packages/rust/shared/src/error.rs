//! Error types for tailor.
//!
//! Library crates use [`TailorError`] via `thiserror`.
//! App crates (cli/web) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all tailor operations.
#[derive(Debug, thiserror::Error)]
pub enum TailorError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page or document.
    #[error("network error: {0}")]
    Network(String),

    /// JSON/HTML parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The listing page could not be fetched or yielded no entries.
    #[error("scrape failed: {0}")]
    ScrapeFailure(String),

    /// Text could not be obtained for an article.
    #[error("cannot resolve text: {0}")]
    Resolution(String),

    /// Language-model call failed.
    #[error("agent error: {0}")]
    Agent(String),

    /// Document bytes could not be turned into text.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The single-shot pipeline was aborted.
    #[error("{0}")]
    Pipeline(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad input, malformed record, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TailorError>;

impl TailorError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a resolution error from any displayable message.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a pipeline error from any displayable message.
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a scrape failure (listing unreachable or empty).
    pub fn is_scrape_failure(&self) -> bool {
        matches!(self, Self::ScrapeFailure(_))
    }
}
