//! Fushigi CLI - grammar practice and journaling from the terminal
//!
//! Reads from the local cache and syncs with the Fushigi backend on request.

mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::common::{load_config, resolve_db_path, CliContext};
use crate::commands::grammar::run_grammar;
use crate::commands::journal::run_journal;
use crate::commands::sentences::run_sentences;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fushigi=info,fushigi_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = CliContext {
        db_path: resolve_db_path(cli.db_path)?,
        config: load_config(cli.config.as_deref(), cli.api_url)?,
        sync_first: cli.sync,
    };

    match cli.command {
        Some(Commands::Sync { refresh, json }) => run_sync(refresh, json, &ctx).await?,
        Some(Commands::Grammar { command }) => run_grammar(command, &ctx).await?,
        Some(Commands::Journal { command }) => run_journal(command, &ctx).await?,
        Some(Commands::Sentences { command }) => run_sentences(command, &ctx).await?,
        Some(Commands::Status { json }) => run_status(json, &ctx).await?,
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
