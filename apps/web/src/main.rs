//! tailor-web: HTTP front end for single-shot example generation.

mod backends;
mod pages;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tailor_core::classify::ClassifyOptions;
use tailor_core::generate::ExampleGenerator;
use tailor_core::template::ExampleTemplate;
use tailor_shared::{load_config, load_config_from, validate_api_key};

use backends::LiveBackends;
use routes::AppState;

/// Serve the single-shot pipeline over HTTP.
#[derive(Parser)]
#[command(name = "tailor-web", version, about, long_about = None)]
struct Args {
    /// Config file to use instead of ~/.tailor/tailor.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Socket address to listen on (defaults to `[web] bind`).
    #[arg(long)]
    bind: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "tailor=info,tower_http=info",
        1 => "tailor=debug,tower_http=debug",
        _ => "tailor=trace,tower_http=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    match args.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init(),
    }

    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    // Missing keys only fail /generate, so the static pages still serve.
    let api_key = match validate_api_key(&config) {
        Ok(key) => Some(key),
        Err(e) => {
            warn!(error = %e, "starting without an API key");
            None
        }
    };

    let template_path = config.generate.template_path.clone().map(PathBuf::from);
    let generator = ExampleGenerator::new(ExampleTemplate::load(template_path.as_deref())?);

    let state = Arc::new(AppState {
        backends: Box::new(LiveBackends::new(api_key)?),
        generator,
        classify: ClassifyOptions::from_config(&config),
        default_model: config.anthropic.default_model.clone(),
    });

    let addr = args.bind.unwrap_or_else(|| config.web.bind.clone());
    info!(%addr, "tailor web server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
