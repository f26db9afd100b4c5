//! slugpress CLI: serve slug-addressed pages and manage their content.
//!
//! Runs the HTTP server, resolves single slugs from the terminal, and
//! imports pages and site settings into the libSQL store.

mod commands;
mod import;

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
