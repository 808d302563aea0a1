//! Application configuration for tailor.
//!
//! User config lives at `~/.tailor/tailor.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TailorError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "tailor.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tailor";

// ---------------------------------------------------------------------------
// Config structs (matching tailor.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Working directories shared by the batch stages.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Anthropic settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Listing page settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Inter-item delays for the batch stages.
    #[serde(default)]
    pub delays: DelaysConfig,

    /// Classification thresholds.
    #[serde(default)]
    pub classify: ClassifyConfig,

    /// Example generation settings.
    #[serde(default)]
    pub generate: GenerateConfig,

    /// HTTP surface settings.
    #[serde(default)]
    pub web: WebConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Downloaded source documents.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Extracted text cache.
    #[serde(default = "default_text_dir")]
    pub text_dir: String,

    /// Article metadata records.
    #[serde(default = "default_articles_dir")]
    pub articles_dir: String,

    /// Classification ledger file.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,

    /// Generated examples.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            text_dir: default_text_dir(),
            articles_dir: default_articles_dir(),
            ledger_path: default_ledger_path(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_source_dir() -> String {
    "data/pdfs".into()
}
fn default_text_dir() -> String {
    "data/md".into()
}
fn default_articles_dir() -> String {
    "data/articles".into()
}
fn default_ledger_path() -> String {
    "data/classifications.json".into()
}
fn default_output_dir() -> String {
    "data/examples".into()
}

/// `[anthropic]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Default model for classification and generation.
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
        }
    }
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".into()
}
fn default_model() -> String {
    "claude-sonnet-4-5-20250929".into()
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Publications listing page scraped by `tailor scrape`.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
        }
    }
}

fn default_listing_url() -> String {
    "https://www.acrocon.com/~wagner/publications.html".into()
}

/// `[delays]` section. All values in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelaysConfig {
    /// Pause between document downloads.
    #[serde(default = "default_download_ms")]
    pub download_ms: u64,

    /// Pause between classification calls.
    #[serde(default = "default_classify_ms")]
    pub classify_ms: u64,

    /// Pause between generation calls.
    #[serde(default = "default_generate_ms")]
    pub generate_ms: u64,
}

impl Default for DelaysConfig {
    fn default() -> Self {
        Self {
            download_ms: default_download_ms(),
            classify_ms: default_classify_ms(),
            generate_ms: default_generate_ms(),
        }
    }
}

fn default_download_ms() -> u64 {
    1000
}
fn default_classify_ms() -> u64 {
    500
}
fn default_generate_ms() -> u64 {
    1000
}

/// `[classify]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Texts shorter than this (in characters) are skipped without a model call.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,

    /// Only this many leading characters are sent to the model.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

fn default_min_chars() -> usize {
    5000
}
fn default_max_prompt_chars() -> usize {
    3000
}

/// `[generate]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Optional file replacing the built-in worked example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,
}

/// `[web]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Socket address for `tailor-web`.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:1234".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.tailor/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| TailorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tailor/tailor.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TailorError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TailorError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TailorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TailorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TailorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the Anthropic API key env var is set and non-empty, returning it.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.anthropic.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(TailorError::config(format!(
            "Anthropic API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("ledger_path"));
        assert!(toml_str.contains("ANTHROPIC_API_KEY"));
        assert!(!toml_str.contains("template_path"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.classify.min_chars, 5000);
        assert_eq!(parsed.classify.max_prompt_chars, 3000);
        assert_eq!(parsed.anthropic.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
output_dir = "/tmp/examples"

[delays]
generate_ms = 0
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.output_dir, "/tmp/examples");
        assert_eq!(config.paths.text_dir, "data/md");
        assert_eq!(config.delays.generate_ms, 0);
        assert_eq!(config.delays.download_ms, 1000);
        assert!(config.generate.template_path.is_none());
    }

    #[test]
    fn load_config_from_reports_bad_toml() {
        let dir = std::env::temp_dir().join(format!("tailor-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("tailor.toml");
        std::fs::write(&path, "[paths\nbroken").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.anthropic.api_key_env = "TAILOR_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
