//! Single-shot pipeline: one URL → one tailored example.
//!
//! Runs as an explicit state machine over [`PipelineStep`]s. Each step has
//! exactly one failure exit, reported through the progress channel with the
//! step that failed. Nothing is written until the final persist step.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use tailor_agent::Agent;
use tailor_crawler::Scraper;
use tailor_document::{DocumentSource, is_document_url};
use tailor_shared::{Article, Result, TailorError, write_atomic};

use crate::classify::{ClassifyOptions, classify_text};
use crate::generate::{ExampleGenerator, warn_on_template_issues};
use crate::progress::ProgressReporter;
use crate::resolver::resolve;

/// Numeric id given to the single example this pipeline produces.
const SINGLE_SHOT_ID: u32 = 1;

/// The stages of a single-shot run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Fetch,
    Classify,
    Generate,
    Persist,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Classify => "classify",
            Self::Generate => "generate",
            Self::Persist => "persist",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Fetch => "Fetching paper",
            Self::Classify => "Classifying paper",
            Self::Generate => "Generating example",
            Self::Persist => "Saving example",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a run currently stands. Each variant carries what later steps need.
#[derive(Debug)]
pub enum PipelineState {
    Start,
    Fetched { article: Article, text: String },
    Classified { article: Article, text: String },
    Generated { article: Article, text: String, example: String },
    Persisted(PipelineOutcome),
}

impl PipelineState {
    /// The step that moves this state forward, if any.
    pub fn next_step(&self) -> Option<PipelineStep> {
        match self {
            Self::Start => Some(PipelineStep::Fetch),
            Self::Fetched { .. } => Some(PipelineStep::Classify),
            Self::Classified { .. } => Some(PipelineStep::Generate),
            Self::Generated { .. } => Some(PipelineStep::Persist),
            Self::Persisted(_) => None,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The article the example was generated for (a stub for bare documents).
    pub article: Article,
    /// Full text of the paper.
    pub paper_text: String,
    /// The generated example, as written to disk.
    pub example: String,
    pub output_path: PathBuf,
}

// ---------------------------------------------------------------------------
// SingleShotPipeline
// ---------------------------------------------------------------------------

/// Capabilities a single-shot run depends on.
pub struct SingleShotPipeline<'a> {
    pub agent: &'a dyn Agent,
    /// Bound to the URL being processed.
    pub scraper: &'a dyn Scraper,
    pub source: &'a dyn DocumentSource,
    pub generator: &'a ExampleGenerator,
    pub classify: ClassifyOptions,
}

impl SingleShotPipeline<'_> {
    /// Turn `url` into an example written at `output_path`.
    ///
    /// With `force`, classification is skipped and a paper is generated
    /// regardless of its verdict.
    #[instrument(skip_all, fields(%url, output = %output_path.display(), force = force))]
    pub async fn run(
        &self,
        url: &str,
        output_path: &Path,
        force: bool,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutcome> {
        let mut state = PipelineState::Start;

        while let Some(step) = state.next_step() {
            progress.phase(step.description());
            state = match self.advance(state, url, output_path, force).await {
                Ok(next) => next,
                Err(e) => {
                    warn!(%step, error = %e, "pipeline step failed");
                    progress.step_failed(step, &e);
                    return Err(e);
                }
            };
        }

        match state {
            PipelineState::Persisted(outcome) => {
                progress.done(&format!("Example written to {}", outcome.output_path.display()));
                Ok(outcome)
            }
            _ => Err(TailorError::pipeline("pipeline stopped before persisting")),
        }
    }

    async fn advance(
        &self,
        state: PipelineState,
        url: &str,
        output_path: &Path,
        force: bool,
    ) -> Result<PipelineState> {
        match state {
            PipelineState::Start => {
                let (article, text) = self.fetch(url).await?;
                Ok(PipelineState::Fetched { article, text })
            }
            PipelineState::Fetched { article, text } => {
                if force {
                    info!("classification skipped (forced)");
                } else {
                    self.check_classification(&text).await?;
                }
                Ok(PipelineState::Classified { article, text })
            }
            PipelineState::Classified { article, text } => {
                let example = self
                    .generator
                    .generate(self.agent, &article, &text, SINGLE_SHOT_ID)
                    .await?;
                warn_on_template_issues(&article.title, &example);
                Ok(PipelineState::Generated {
                    article,
                    text,
                    example,
                })
            }
            PipelineState::Generated {
                article,
                text,
                example,
            } => {
                persist(output_path, &example)?;
                info!(path = %output_path.display(), "example written");
                Ok(PipelineState::Persisted(PipelineOutcome {
                    article,
                    paper_text: text,
                    example,
                    output_path: output_path.to_path_buf(),
                }))
            }
            PipelineState::Persisted(outcome) => Ok(PipelineState::Persisted(outcome)),
        }
    }

    /// Obtain the article and its text.
    ///
    /// Document URLs are fetched directly as a stub article. Anything else
    /// goes through the scraper, falling back to a direct fetch when the
    /// scrape fails or finds nothing.
    async fn fetch(&self, url: &str) -> Result<(Article, String)> {
        if is_document_url(url) {
            return self.fetch_document(url).await;
        }

        let articles = match self.scraper.scrape().await {
            Ok(articles) => articles,
            Err(e) if e.is_scrape_failure() => {
                warn!(error = %e, "scrape failed, treating URL as a document");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let Some(article) = articles.into_iter().next() else {
            return self.fetch_document(url).await;
        };

        if article.source_url.is_none() {
            return Err(TailorError::pipeline(format!(
                "'{}' has no document URL to fetch",
                article.title
            )));
        }

        let text = resolve(&article, None, self.source).await?;
        Ok((article, text))
    }

    async fn fetch_document(&self, url: &str) -> Result<(Article, String)> {
        let article = Article::stub(url);
        let text = resolve(&article, None, self.source).await?;
        Ok((article, text))
    }

    async fn check_classification(&self, text: &str) -> Result<()> {
        let verdict = classify_text(self.agent, text, &self.classify).await?;
        info!(
            real_world = verdict.is_real_world_application,
            reason = %verdict.reason,
            "paper classified"
        );

        if verdict.is_real_world_application {
            Ok(())
        } else {
            Err(TailorError::pipeline(format!(
                "paper is not classified as a real-world application ({}); use force to generate anyway",
                verdict.reason
            )))
        }
    }
}

fn persist(path: &Path, example: &str) -> Result<()> {
    write_atomic(path, example)
}
