mod digest;
mod history;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "infoia")]
#[command(about = "Daily AI news digest, summarized in Spanish")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every source and commit today's digest (the default command)
    Run {
        /// Source registry file; overrides `INFOIA_SOURCES_PATH`
        #[arg(long, value_name = "PATH")]
        sources: Option<PathBuf>,
        /// Build the digest without committing or exporting it
        #[arg(long)]
        dry_run: bool,
    },
    /// List configured sources and their categories
    Sources {
        #[arg(long, value_name = "PATH")]
        sources: Option<PathBuf>,
    },
    /// Show recent digest runs
    History {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Print a stored digest
    Show {
        /// Edition date (YYYY-MM-DD); latest digest overall when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },
    /// Seen-index totals
    Stats,
    /// Forget identities first seen more than N days ago
    Prune {
        #[arg(long)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = infoia_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command.unwrap_or(Commands::Run {
        sources: None,
        dry_run: false,
    }) {
        Commands::Run { sources, dry_run } => {
            digest::run_digest(&config, sources, dry_run).await?;
        }
        Commands::Sources { sources } => {
            digest::list_sources(&config, sources)?;
        }
        Commands::History { limit } => {
            let store = history::open_store(&config).await?;
            history::print_history(&store, limit).await?;
        }
        Commands::Show { date, json } => {
            let store = history::open_store(&config).await?;
            history::show_digest(&store, date, json).await?;
        }
        Commands::Stats => {
            let store = history::open_store(&config).await?;
            history::print_stats(&store).await?;
        }
        Commands::Prune { days } => {
            let store = history::open_store(&config).await?;
            history::prune(&store, days).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
