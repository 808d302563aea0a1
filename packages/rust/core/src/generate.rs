//! Generate stage: rewrite each real-world paper into the example template.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, instrument, warn};

use tailor_agent::{Agent, AskOptions};
use tailor_document::DocumentSource;
use tailor_shared::{Article, ClassificationResult, Result, TailorError, write_atomic};

use crate::classify::load_ledger;
use crate::frontmatter::validate_example;
use crate::progress::ProgressReporter;
use crate::resolver::resolve;
use crate::template::ExampleTemplate;
use crate::pause;

pub const GENERATE_SYSTEM_PROMPT: &str = "You are a research assistant that extracts structured \
     information from academic papers. You produce output in a specific markdown format. \
     Output only the requested format, nothing else.";

pub const GENERATE_MAX_TOKENS: u32 = 4096;

/// Link text used when an article has no citable link.
pub const NO_LINK: &str = "_No link available_";

/// Labels that mark a publisher or DOI link.
const PREFERRED_LINK_KEYWORDS: &[&str] = &["doi", "acm", "springer", "elsevier", "ieee", "online"];

/// The most citable link of an article.
///
/// Publisher/DOI links come first, then any link not labelled `pdf`.
/// Raw `pdf` links are never chosen.
pub fn best_link(article: &Article) -> Option<&str> {
    let preferred = article.links.iter().find(|(label, _)| {
        let label = label.to_lowercase();
        PREFERRED_LINK_KEYWORDS.iter().any(|k| label.contains(k))
    });

    preferred
        .or_else(|| {
            article
                .links
                .iter()
                .find(|(label, _)| !label.eq_ignore_ascii_case("pdf"))
        })
        .map(|(_, url)| url.as_str())
}

/// Known metadata appended to the prompt so the model does not guess it.
pub fn metadata_block(article: &Article) -> String {
    [
        String::new(),
        "I already know the following metadata for this paper, use it directly:".to_string(),
        format!("- Title: {}", article.title),
        format!("- Authors: {}", article.authors.join(", ")),
        format!("- Venue: {}", article.venue),
        format!("- Link: {}", best_link(article).unwrap_or(NO_LINK)),
    ]
    .join("\n")
}

// ---------------------------------------------------------------------------
// ExampleGenerator
// ---------------------------------------------------------------------------

/// Renders one example per paper from an injected template.
#[derive(Debug, Clone, Default)]
pub struct ExampleGenerator {
    template: ExampleTemplate,
}

impl ExampleGenerator {
    pub fn new(template: ExampleTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &ExampleTemplate {
        &self.template
    }

    /// The question sent alongside the paper text.
    pub fn prompt(&self, article: &Article, paper_id: u32) -> String {
        self.template.render(paper_id, &metadata_block(article))
    }

    /// Ask the agent for the example; the answer is returned unmodified.
    #[instrument(skip_all, fields(title = %article.title, paper_id = paper_id))]
    pub async fn generate(
        &self,
        agent: &dyn Agent,
        article: &Article,
        text: &str,
        paper_id: u32,
    ) -> Result<String> {
        agent
            .ask(
                text,
                &self.prompt(article, paper_id),
                &AskOptions::new(GENERATE_SYSTEM_PROMPT, GENERATE_MAX_TOKENS),
            )
            .await
    }
}

/// Log template deviations without rejecting the output.
pub(crate) fn warn_on_template_issues(label: &str, markdown: &str) {
    for issue in validate_example(markdown) {
        warn!(example = %label, %issue, "generated example deviates from template");
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Inputs and outputs of the generate stage.
#[derive(Debug, Clone)]
pub struct GenerateAllConfig {
    pub articles_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub text_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Pause after each item that called the agent.
    pub delay: Duration,
}

/// Generate an example for every positive ledger entry without one.
///
/// The numeric id of an example is its 1-based position among the positive
/// entries. Returns every positive entry's output that exists afterwards.
#[instrument(skip_all, fields(ledger = %config.ledger_path.display(), output_dir = %config.output_dir.display()))]
pub async fn generate_all(
    agent: &dyn Agent,
    source: &dyn DocumentSource,
    generator: &ExampleGenerator,
    config: &GenerateAllConfig,
    progress: &dyn ProgressReporter,
) -> Result<Vec<PathBuf>> {
    let ledger = load_ledger(&config.ledger_path)?;
    let positive: Vec<&ClassificationResult> = ledger
        .iter()
        .filter(|entry| entry.is_real_world_application)
        .collect();

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| TailorError::io(&config.output_dir, e))?;

    info!(positive = positive.len(), ledger = ledger.len(), "generating examples");
    progress.phase("Generating examples");

    let total = positive.len();
    let mut produced = Vec::with_capacity(total);

    for (i, entry) in positive.iter().enumerate() {
        let paper_id = u32::try_from(i + 1).unwrap_or(u32::MAX);
        let output = config.output_dir.join(&entry.file);
        progress.item(i + 1, total, &entry.file);

        if output.exists() {
            produced.push(output);
            continue;
        }

        let record = config.articles_dir.join(format!("{}.json", entry.stem()));
        if !record.is_file() {
            let err = TailorError::validation(format!(
                "no article record {} for {}",
                record.display(),
                entry.file
            ));
            warn!(file = %entry.file, error = %err, "skipping");
            progress.item_failed(&entry.file, &err);
            continue;
        }

        match generate_one(agent, source, generator, config, &record, &output, paper_id).await {
            Ok(()) => produced.push(output),
            Err(e) => {
                warn!(file = %entry.file, error = %e, "generation failed");
                progress.item_failed(&entry.file, &e);
            }
        }

        if i + 1 < total {
            pause(config.delay).await;
        }
    }

    info!(produced = produced.len(), total, "generation completed");
    progress.done(&format!("{}/{total} examples available", produced.len()));

    Ok(produced)
}

async fn generate_one(
    agent: &dyn Agent,
    source: &dyn DocumentSource,
    generator: &ExampleGenerator,
    config: &GenerateAllConfig,
    record: &Path,
    output: &Path,
    paper_id: u32,
) -> Result<()> {
    let article = Article::load(record)?;
    let text = resolve(&article, Some(config.text_dir.as_path()), source).await?;
    let example = generator.generate(agent, &article, &text, paper_id).await?;

    warn_on_template_issues(&output.display().to_string(), &example);
    write_atomic(output, example)
}
