//! Classify stage: does a paper describe a real-world application?

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use tailor_agent::{Agent, AskOptions};
use tailor_shared::{AppConfig, ClassificationResult, Result, TailorError, Verdict, write_atomic};

use crate::convert::TEXT_EXTENSION;
use crate::progress::ProgressReporter;
use crate::{file_name, files_with_extension, pause};

/// Question asked of every paper long enough to classify.
pub const CLASSIFICATION_PROMPT: &str = "\
Is this paper primarily about a real-world application (e.g. engineering, \
healthcare, logistics, energy systems, software engineering on real codebases, \
etc.) as opposed to being purely theoretical, a benchmark study on synthetic \
problems, or a survey/editorial?

Respond with ONLY a JSON object in this exact format, no other text:
{\"is_real_world_application\": true, \"reason\": \"short reason here\"}
";

pub const CLASSIFY_SYSTEM_PROMPT: &str = "You are a research paper classifier. You classify \
     papers as being about real-world applications or not. Respond only with the requested JSON.";

pub const CLASSIFY_MAX_TOKENS: u32 = 256;

/// Reason recorded for texts below the length threshold.
pub const TOO_SHORT_REASON: &str = "skipped: too short (likely slides/poster)";

const PARSE_ERROR_EXCERPT_CHARS: usize = 200;

/// Length thresholds and pacing for classification.
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Texts with fewer characters are rejected without asking the agent.
    pub min_chars: usize,
    /// Only this many leading characters are sent.
    pub max_prompt_chars: usize,
    /// Pause between agent calls in a batch.
    pub delay: Duration,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            min_chars: 5000,
            max_prompt_chars: 3000,
            delay: Duration::from_millis(500),
        }
    }
}

impl ClassifyOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_chars: config.classify.min_chars,
            max_prompt_chars: config.classify.max_prompt_chars,
            delay: Duration::from_millis(config.delays.classify_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Single paper
// ---------------------------------------------------------------------------

/// Classify one paper's text.
///
/// Short texts are rejected locally. Unparseable answers become negative
/// verdicts; only agent/transport failures are errors.
pub async fn classify_text(
    agent: &dyn Agent,
    text: &str,
    options: &ClassifyOptions,
) -> Result<Verdict> {
    let chars = text.chars().count();
    if chars < options.min_chars {
        debug!(chars, min = options.min_chars, "text too short to classify");
        return Ok(Verdict::rejected(TOO_SHORT_REASON));
    }

    let excerpt = truncate_chars(text, options.max_prompt_chars);
    let raw = agent
        .ask(
            excerpt,
            CLASSIFICATION_PROMPT,
            &AskOptions::new(CLASSIFY_SYSTEM_PROMPT, CLASSIFY_MAX_TOKENS),
        )
        .await?;

    Ok(parse_verdict(&raw))
}

/// Interpret the agent's answer.
///
/// Accepts a bare JSON object or one wrapped in prose (the span from the
/// first `{` to the last `}`). Anything else is a negative verdict whose
/// reason starts with `parse error:`.
pub fn parse_verdict(raw: &str) -> Verdict {
    verdict_from_json(raw.trim())
        .or_else(|| {
            let start = raw.find('{')?;
            let end = raw.rfind('}')?;
            (end > start)
                .then(|| verdict_from_json(&raw[start..=end]))
                .flatten()
        })
        .unwrap_or_else(|| {
            Verdict::rejected(format!(
                "parse error: {}",
                truncate_chars(raw, PARSE_ERROR_EXCERPT_CHARS)
            ))
        })
}

fn verdict_from_json(candidate: &str) -> Option<Verdict> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    let is_real_world_application = value.get("is_real_world_application")?.as_bool()?;
    let reason = value
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(Verdict {
        is_real_world_application,
        reason,
    })
}

/// The first `max` characters of `text`, on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Classify every cached text file and rewrite the ledger.
///
/// Every file yields exactly one entry, in file-name order. A file that
/// cannot be read or classified is recorded as negative with reason
/// `error: <message>`.
#[instrument(skip_all, fields(text_dir = %text_dir.display(), ledger = %ledger_path.display()))]
pub async fn classify_all(
    agent: &dyn Agent,
    text_dir: &Path,
    ledger_path: &Path,
    options: &ClassifyOptions,
    progress: &dyn ProgressReporter,
) -> Result<Vec<ClassificationResult>> {
    let files = files_with_extension(text_dir, TEXT_EXTENSION)?;

    progress.phase("Classifying papers");
    let total = files.len();
    let mut results = Vec::with_capacity(total);

    for (i, path) in files.iter().enumerate() {
        let name = file_name(path);
        progress.item(i + 1, total, &name);

        let outcome = match std::fs::read_to_string(path) {
            Ok(text) => classify_text(agent, &text, options).await,
            Err(e) => Err(TailorError::io(path, e)),
        };

        let verdict = outcome.unwrap_or_else(|e| {
            warn!(file = %name, error = %e, "classification failed");
            progress.item_failed(&name, &e);
            Verdict::rejected(format!("error: {e}"))
        });

        debug!(
            file = %name,
            real_world = verdict.is_real_world_application,
            reason = %verdict.reason,
            "classified"
        );
        results.push(ClassificationResult::new(name, verdict));

        if i + 1 < total {
            pause(options.delay).await;
        }
    }

    save_ledger(ledger_path, &results)?;

    let positive = results.iter().filter(|r| r.is_real_world_application).count();
    info!(total, positive, "classification completed");
    progress.done(&format!("{positive} of {total} papers are real-world applications"));

    Ok(results)
}

/// Read a classification ledger.
pub fn load_ledger(path: &Path) -> Result<Vec<ClassificationResult>> {
    let content = std::fs::read_to_string(path).map_err(|e| TailorError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| TailorError::parse(format!("invalid ledger {}: {e}", path.display())))
}

/// Overwrite the ledger with `results` as a pretty JSON array.
pub fn save_ledger(path: &Path, results: &[ClassificationResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)
        .map_err(|e| TailorError::parse(format!("failed to serialize ledger: {e}")))?;
    write_atomic(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SilentProgress;
    use crate::testing::{ScriptedAgent, temp_dir};

    fn no_delay() -> ClassifyOptions {
        ClassifyOptions {
            delay: Duration::ZERO,
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // parse_verdict
    // -----------------------------------------------------------------------

    #[test]
    fn parses_bare_json() {
        let v = parse_verdict(r#"{"is_real_world_application": true, "reason": "hospital fleet"}"#);
        assert!(v.is_real_world_application);
        assert_eq!(v.reason, "hospital fleet");
    }

    #[test]
    fn parses_prose_wrapped_json() {
        let v = parse_verdict(
            "Sure! Here you go:\n{\"is_real_world_application\": false, \"reason\": \"survey\"}\nThanks.",
        );
        assert!(!v.is_real_world_application);
        assert_eq!(v.reason, "survey");
    }

    #[test]
    fn missing_reason_defaults_to_empty() {
        let v = parse_verdict(r#"{"is_real_world_application": true}"#);
        assert!(v.is_real_world_application);
        assert_eq!(v.reason, "");
    }

    #[test]
    fn braceless_answer_is_parse_error() {
        let v = parse_verdict("I think it is applied.");
        assert!(!v.is_real_world_application);
        assert_eq!(v.reason, "parse error: I think it is applied.");
    }

    #[test]
    fn object_without_flag_is_parse_error() {
        let v = parse_verdict(r#"{"answer": "yes"}"#);
        assert!(!v.is_real_world_application);
        assert!(v.reason.starts_with("parse error: "));
    }

    #[test]
    fn parse_error_excerpt_is_capped() {
        let raw = "é".repeat(500);
        let v = parse_verdict(&raw);
        assert_eq!(v.reason.chars().count(), "parse error: ".len() + 200);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    // -----------------------------------------------------------------------
    // classify_text
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn short_text_skips_agent() {
        let agent = ScriptedAgent::new(&[r#"{"is_real_world_application": true}"#]);
        let verdict = classify_text(&agent, "tiny poster", &no_delay()).await.unwrap();

        assert!(!verdict.is_real_world_application);
        assert_eq!(verdict.reason, TOO_SHORT_REASON);
        assert_eq!(agent.calls(), 0);
    }

    #[tokio::test]
    async fn long_text_is_truncated_before_asking() {
        let agent = ScriptedAgent::new(&[r#"{"is_real_world_application": true, "reason": "r"}"#]);
        let text = "x".repeat(6000);

        let verdict = classify_text(&agent, &text, &no_delay()).await.unwrap();

        assert!(verdict.is_real_world_application);
        let questions = agent.questions.lock().unwrap();
        let (prompt, options) = &questions[0];
        assert!(prompt.starts_with(&format!("{}\n", "x".repeat(3000))));
        assert_eq!(options.max_tokens, CLASSIFY_MAX_TOKENS);
        assert_eq!(options.system.as_deref(), Some(CLASSIFY_SYSTEM_PROMPT));
    }

    // -----------------------------------------------------------------------
    // classify_all
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn batch_writes_one_entry_per_file() {
        let root = temp_dir("classify");
        let md = root.join("md");
        std::fs::create_dir_all(&md).unwrap();
        std::fs::write(md.join("b.md"), "y".repeat(6000)).unwrap();
        std::fs::write(md.join("a.md"), "short").unwrap();
        let ledger = root.join("out/classifications.json");

        let agent = ScriptedAgent::new(&[r#"{"is_real_world_application": true, "reason": "applied"}"#]);
        let results = classify_all(&agent, &md, &ledger, &no_delay(), &SilentProgress)
            .await
            .unwrap();

        let files: Vec<&str> = results.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(files, vec!["a.md", "b.md"]);
        assert_eq!(results[0].reason, TOO_SHORT_REASON);
        assert!(results[1].is_real_world_application);
        assert_eq!(agent.calls(), 1);

        let persisted = load_ledger(&ledger).unwrap();
        assert_eq!(persisted, results);
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn agent_failure_becomes_error_entry() {
        let root = temp_dir("classify-err");
        std::fs::write(root.join("p.md"), "z".repeat(6000)).unwrap();
        let ledger = root.join("ledger.json");

        let agent = ScriptedAgent::new(&[]);
        let results = classify_all(&agent, &root, &ledger, &no_delay(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(!results[0].is_real_world_application);
        assert!(results[0].reason.starts_with("error: "));
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn delay_runs_between_files_only() {
        let root = temp_dir("classify-delay");
        let md = root.join("md");
        std::fs::create_dir_all(&md).unwrap();
        for name in ["a", "b", "c"] {
            std::fs::write(md.join(format!("{name}.md")), "z".repeat(6000)).unwrap();
        }
        let agent = ScriptedAgent::new(&[r#"{"is_real_world_application": true}"#]);
        let options = ClassifyOptions {
            delay: Duration::from_millis(200),
            ..Default::default()
        };

        let started = std::time::Instant::now();
        let results = classify_all(
            &agent,
            &md,
            &root.join("ledger.json"),
            &options,
            &SilentProgress,
        )
        .await
        .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(results.len(), 3);
        assert_eq!(agent.calls(), 3);
        assert!(elapsed >= Duration::from_millis(400), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(600), "{elapsed:?}");
        std::fs::remove_dir_all(&root).ok();
    }
}
