//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use tailor_agent::AnthropicAgent;
use tailor_core::ProgressReporter;
use tailor_core::classify::{ClassifyOptions, classify_all};
use tailor_core::convert::convert_all;
use tailor_core::generate::{ExampleGenerator, GenerateAllConfig, generate_all};
use tailor_core::pipeline::{PipelineStep, SingleShotPipeline};
use tailor_core::scrape::{ScrapeAllConfig, scrape_all};
use tailor_core::template::ExampleTemplate;
use tailor_crawler::AcroconScraper;
use tailor_document::HttpDocumentSource;
use tailor_shared::{
    AppConfig, TailorError, init_config, load_config, load_config_from, validate_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// tailor: turn a publications page into tailored-example summaries.
#[derive(Parser)]
#[command(
    name = "tailor",
    version,
    about = "Scrape publications, classify real-world papers and generate tailored examples.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.tailor/tailor.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape the listing page into article records and download PDFs.
    Scrape {
        /// Listing page URL (defaults to the configured one).
        #[arg(long)]
        url: Option<String>,

        /// Directory for article records.
        #[arg(long)]
        articles_dir: Option<PathBuf>,

        /// Directory for downloaded PDFs.
        #[arg(long)]
        pdf_dir: Option<PathBuf>,
    },

    /// Extract text from every downloaded PDF without cached text.
    Convert {
        /// Directory of downloaded PDFs.
        #[arg(long)]
        pdf_dir: Option<PathBuf>,

        /// Directory for extracted text.
        #[arg(long)]
        md_dir: Option<PathBuf>,
    },

    /// Classify every extracted paper and rewrite the ledger.
    Classify {
        /// Directory of extracted text.
        #[arg(long)]
        md_dir: Option<PathBuf>,

        /// Ledger file to write.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model to use (defaults to the configured one).
        #[arg(long)]
        model: Option<String>,
    },

    /// Generate examples for every real-world paper in the ledger.
    Generate {
        /// Directory of article records.
        #[arg(long)]
        articles_dir: Option<PathBuf>,

        /// Ledger file to read.
        #[arg(long)]
        classifications: Option<PathBuf>,

        /// Directory of extracted text.
        #[arg(long)]
        md_dir: Option<PathBuf>,

        /// Directory for generated examples.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Model to use (defaults to the configured one).
        #[arg(long)]
        model: Option<String>,

        /// Prompt template replacing the built-in worked example.
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Generate one example from a PDF URL or a publications page.
    FromUrl {
        /// PDF URL or listing page URL.
        url: String,

        /// Output markdown file.
        #[arg(short, long, default_value = "generated_example.md")]
        output: PathBuf,

        /// Model to use (defaults to the configured one).
        #[arg(long)]
        model: Option<String>,

        /// Generate even if the paper is not classified as a real-world application.
        #[arg(long)]
        force: bool,

        /// Prompt template replacing the built-in worked example.
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tailor=info",
        1 => "tailor=debug",
        _ => "tailor=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        };
    }

    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Scrape {
            url,
            articles_dir,
            pdf_dir,
        } => cmd_scrape(&config, url, articles_dir, pdf_dir).await,
        Command::Convert { pdf_dir, md_dir } => cmd_convert(&config, pdf_dir, md_dir),
        Command::Classify {
            md_dir,
            output,
            model,
        } => cmd_classify(&config, md_dir, output, model).await,
        Command::Generate {
            articles_dir,
            classifications,
            md_dir,
            output_dir,
            model,
            template,
        } => {
            let dirs = GenerateAllConfig {
                articles_dir: articles_dir.unwrap_or_else(|| config.paths.articles_dir.clone().into()),
                ledger_path: classifications.unwrap_or_else(|| config.paths.ledger_path.clone().into()),
                text_dir: md_dir.unwrap_or_else(|| config.paths.text_dir.clone().into()),
                output_dir: output_dir.unwrap_or_else(|| config.paths.output_dir.clone().into()),
                delay: Duration::from_millis(config.delays.generate_ms),
            };
            cmd_generate(&config, dirs, model, template).await
        }
        Command::FromUrl {
            url,
            output,
            model,
            force,
            template,
        } => cmd_from_url(&config, &url, &output, model, force, template).await,
        Command::Config { .. } => Ok(()),
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Validate the API key and build the agent for `model` (or the default).
fn build_agent(config: &AppConfig, model: Option<String>) -> Result<AnthropicAgent> {
    let api_key = validate_api_key(config)?;
    let model = model.unwrap_or_else(|| config.anthropic.default_model.clone());
    info!(%model, "using Anthropic model");
    Ok(AnthropicAgent::new(api_key, model)?)
}

fn build_generator(config: &AppConfig, template: Option<PathBuf>) -> Result<ExampleGenerator> {
    let path = template.or_else(|| config.generate.template_path.clone().map(PathBuf::from));
    Ok(ExampleGenerator::new(ExampleTemplate::load(path.as_deref())?))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(
    config: &AppConfig,
    url: Option<String>,
    articles_dir: Option<PathBuf>,
    pdf_dir: Option<PathBuf>,
) -> Result<()> {
    let url = url.unwrap_or_else(|| config.scrape.listing_url.clone());
    let scraper = AcroconScraper::new(&url)?;
    let source = HttpDocumentSource::new()?;

    let stage = ScrapeAllConfig {
        articles_dir: articles_dir.unwrap_or_else(|| config.paths.articles_dir.clone().into()),
        source_dir: pdf_dir.unwrap_or_else(|| config.paths.source_dir.clone().into()),
        download_delay: Duration::from_millis(config.delays.download_ms),
    };

    info!(%url, "scraping listing");
    let reporter = CliProgress::new();
    let report = scrape_all(&scraper, &source, &stage, &reporter).await?;

    println!();
    println!("  Articles found:    {}", report.found);
    println!("  Records written:   {}", report.records_written);
    println!("  Records existing:  {}", report.records_existing);
    println!("  PDFs downloaded:   {}", report.downloads);
    println!("  PDFs already here: {}", report.downloads_skipped);
    println!("  Failures:          {}", report.failures.len());
    for (key, message) in &report.failures {
        println!("    {key}: {message}");
    }
    println!();

    Ok(())
}

fn cmd_convert(config: &AppConfig, pdf_dir: Option<PathBuf>, md_dir: Option<PathBuf>) -> Result<()> {
    let pdf_dir = pdf_dir.unwrap_or_else(|| config.paths.source_dir.clone().into());
    let md_dir = md_dir.unwrap_or_else(|| config.paths.text_dir.clone().into());
    let source = HttpDocumentSource::new()?;

    let reporter = CliProgress::new();
    let paths = convert_all(&source, &pdf_dir, &md_dir, &reporter)?;

    println!();
    println!("  Text files available: {}", paths.len());
    println!("  Path: {}", md_dir.display());
    println!();

    Ok(())
}

async fn cmd_classify(
    config: &AppConfig,
    md_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    model: Option<String>,
) -> Result<()> {
    let agent = build_agent(config, model)?;
    let md_dir = md_dir.unwrap_or_else(|| config.paths.text_dir.clone().into());
    let ledger = output.unwrap_or_else(|| config.paths.ledger_path.clone().into());

    let reporter = CliProgress::new();
    let results = classify_all(
        &agent,
        &md_dir,
        &ledger,
        &ClassifyOptions::from_config(config),
        &reporter,
    )
    .await?;

    let positive = results.iter().filter(|r| r.is_real_world_application).count();
    println!();
    println!("  Papers classified: {}", results.len());
    println!("  Real-world:        {positive}");
    println!("  Ledger:            {}", ledger.display());
    println!();

    Ok(())
}

async fn cmd_generate(
    config: &AppConfig,
    dirs: GenerateAllConfig,
    model: Option<String>,
    template: Option<PathBuf>,
) -> Result<()> {
    let agent = build_agent(config, model)?;
    let generator = build_generator(config, template)?;
    let source = HttpDocumentSource::new()?;

    let reporter = CliProgress::new();
    let produced = generate_all(&agent, &source, &generator, &dirs, &reporter).await?;

    println!();
    println!("  Examples available: {}", produced.len());
    println!("  Path: {}", dirs.output_dir.display());
    println!();

    Ok(())
}

async fn cmd_from_url(
    config: &AppConfig,
    url: &str,
    output: &Path,
    model: Option<String>,
    force: bool,
    template: Option<PathBuf>,
) -> Result<()> {
    let agent = build_agent(config, model)?;
    let generator = build_generator(config, template)?;
    let scraper = AcroconScraper::new(url)?;
    let source = HttpDocumentSource::new()?;

    let pipeline = SingleShotPipeline {
        agent: &agent,
        scraper: &scraper,
        source: &source,
        generator: &generator,
        classify: ClassifyOptions::from_config(config),
    };

    let reporter = CliProgress::new();
    let outcome = pipeline.run(url, output, force, &reporter).await?;

    println!();
    println!("  Example generated!");
    println!("  Title:  {}", outcome.article.title);
    println!("  Output: {}", outcome.output_path.display());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item(&self, current: usize, total: usize, detail: &str) {
        self.spinner.set_message(format!("[{current}/{total}] {detail}"));
    }

    fn item_failed(&self, detail: &str, error: &TailorError) {
        self.spinner.println(format!("  ✗ {detail}: {error}"));
    }

    fn step_failed(&self, step: PipelineStep, error: &TailorError) {
        self.spinner.finish_and_clear();
        eprintln!("  ✗ {step} failed: {error}");
    }

    fn done(&self, summary: &str) {
        self.spinner.finish_and_clear();
        info!(summary, "done");
    }
}
