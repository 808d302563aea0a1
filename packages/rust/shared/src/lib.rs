//! Shared types, error model, and configuration for tailor.
//!
//! This crate is the foundation depended on by all other tailor crates.
//! It provides:
//! - [`TailorError`]: the unified error type
//! - Domain types ([`Article`], [`Verdict`], [`ClassificationResult`])
//! - Stable-key helpers ([`file_stem`], [`slugify`], [`stable_key`])
//! - Configuration ([`AppConfig`], config loading)
//! - Crash-safe writes ([`write_atomic`])

pub mod config;
pub mod error;
pub mod fs;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnthropicConfig, AppConfig, ClassifyConfig, DelaysConfig, GenerateConfig, PathsConfig,
    ScrapeConfig, WebConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_api_key,
};
pub use error::{Result, TailorError};
pub use fs::{PARTIAL_SUFFIX, partial_path, write_atomic};
pub use types::{
    Article, ClassificationResult, UNKNOWN_AUTHOR, UNKNOWN_TITLE, UNKNOWN_VENUE, Verdict,
    file_stem, slugify, stable_key, url_file_stem,
};
