//! ClarifyMD CLI: plain-language explanations for medical reports.
//!
//! Identifies the medical terms in a report, explains each one for a lay
//! reader, and has the model double-check every explanation.

mod adapters;
mod commands;
mod render;

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
