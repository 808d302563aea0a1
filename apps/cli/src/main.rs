//! tailor CLI: publications → tailored-example summaries.
//!
//! Scrapes a publications listing, extracts paper text, classifies papers
//! as real-world applications and rewrites them into a fixed template.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
