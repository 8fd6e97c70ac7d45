//! Inkpad CLI - rich-text notes from the command line
//!
//! Notes live in a local mirror until a profile signs in; after that they are
//! read from and written to the Supabase notes table.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::CliContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::export::run_export;
use crate::commands::import::run_import;
use crate::commands::list::run_list;
use crate::commands::open::run_open;
use crate::commands::rename::run_rename;
use crate::commands::search::run_search;
use crate::commands::show::run_show;
use crate::commands::stats::run_stats;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "inkpad=warn,inkpad_core=warn";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let context = CliContext {
        data_dir: cli.data_dir,
        profile: cli.profile,
        config_path: None,
    };

    match cli.command {
        Some(Commands::Add { title, content }) => {
            run_add(title.as_deref(), &content, &context).await?;
        }
        Some(Commands::List { limit, json }) => run_list(limit, json, &context).await?,
        Some(Commands::Show { id }) => run_show(id.as_deref(), &context).await?,
        Some(Commands::Open { id }) => run_open(&id, &context).await?,
        Some(Commands::Edit { id }) => run_edit(id.as_deref(), &context).await?,
        Some(Commands::Rename { id, title }) => run_rename(&id, &title, &context).await?,
        Some(Commands::Delete { id }) => run_delete(&id, &context).await?,
        Some(Commands::Search { query, limit, json }) => {
            run_search(&query, limit, json, &context).await?;
        }
        Some(Commands::Stats { id, json }) => run_stats(id.as_deref(), json, &context).await?,
        Some(Commands::Import { path, mime_type }) => {
            run_import(&path, mime_type.as_deref(), &context).await?;
        }
        Some(Commands::Export { id, output }) => {
            run_export(id.as_deref(), output.as_deref(), &context).await?;
        }
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Config { command }) => run_config(command, context.profile.as_deref())?,
        Some(Commands::Auth { command }) => run_auth(command, &context).await?,
        None => {
            // Quick capture mode: inkpad "my thought"
            if cli.note.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                run_add(None, &cli.note, &context).await?;
            }
        }
    }

    Ok(())
}
