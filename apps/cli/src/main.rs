//! remotejobs CLI: aggregate remote job postings into a local catalog.
//!
//! `refresh` scrapes the configured job boards and stores new postings;
//! `list` shows the recent salaried ones, sorted and filtered.

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
