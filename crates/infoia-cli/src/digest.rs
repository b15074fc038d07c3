//! `run` and `sources` command handlers.
//!
//! A run failure surfaces as an error from `main`, so the process exits
//! non-zero whenever nothing was committed.

use std::path::PathBuf;
use std::sync::Arc;

use infoia_core::{AppConfig, BlockStatus, Digest};
use infoia_db::DigestStore;
use infoia_digest::{load_sources, Pipeline, RunOptions, RunReport};
use infoia_sources::{FetchConfig, Fetcher};
use infoia_summarizer::{ChatCompletionsClient, Summarizer, SummarizerConfig};

/// Run the whole pipeline once and print a short report.
///
/// Ctrl-C before the commit cancels the run and leaves the seen index as it
/// was.
///
/// # Errors
///
/// Returns an error if the registry is invalid, the HTTP clients cannot be
/// built, the database is unavailable, the commit fails, or the run is
/// cancelled.
pub(crate) async fn run_digest(
    config: &AppConfig,
    sources: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let registry = load_sources(sources.as_deref().or(config.sources_path.as_deref()))?;

    let pool = infoia_db::connect_from_app_config(config).await?;
    let store = Arc::new(DigestStore::new(pool));

    let fetcher = Fetcher::new(FetchConfig::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

    let summarizer_config = SummarizerConfig::from_app_config(config);
    let summarizer = match ChatCompletionsClient::from_app_config(config)? {
        Some(client) => Summarizer::new(Arc::new(client), summarizer_config),
        None => {
            tracing::warn!(
                "INFOIA_LLM_API_KEY is not set, digest will carry untranslated excerpts"
            );
            Summarizer::disabled(summarizer_config)
        }
    };

    let options = RunOptions {
        dry_run,
        ..RunOptions::from_app_config(config)
    };
    let pipeline = Pipeline::new(registry, fetcher, summarizer, store, options);

    let report = pipeline.run(ctrl_c()).await?;
    print!("{}", render_report(&report));
    Ok(())
}

/// Print the registry, one source per line.
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded.
pub(crate) fn list_sources(config: &AppConfig, sources: Option<PathBuf>) -> anyhow::Result<()> {
    let registry = load_sources(sources.as_deref().or(config.sources_path.as_deref()))?;
    for source in registry.list_sources() {
        println!(
            "{:<24} {:<13} {:<12} {}{}",
            source.id,
            source.category.key(),
            source.parser.name(),
            source.endpoint,
            if source.enabled { "" } else { " (disabled)" }
        );
    }
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c, run is not cancellable");
        std::future::pending::<()>().await;
    }
    tracing::info!("received ctrl-c, cancelling run");
}

pub(crate) fn render_report(report: &RunReport) -> String {
    let stats = &report.stats;
    let mut out = format!(
        "run {} ({}): {} items, {} sources ({} failed), {} duplicates, \
         {} degraded categories, {} partial\n",
        report.digest.run_id,
        report.state,
        stats.emitted,
        stats.sources,
        stats.failed_sources,
        stats.duplicates,
        stats.degraded_categories,
        stats.partial_categories,
    );
    out.push_str(&render_digest(&report.digest));
    if let Some(path) = &report.export_path {
        out.push_str(&format!("exported to {}\n", path.display()));
    }
    out
}

/// Plain-text outline of a digest: sections, titles, and summaries.
pub(crate) fn render_digest(digest: &Digest) -> String {
    let mut out = format!("Edición {}\n", digest.edition);
    for block in &digest.blocks {
        let marker = match block.status {
            BlockStatus::Complete => "",
            BlockStatus::Partial => " [parcial]",
            BlockStatus::Degraded => " [sin traducir]",
        };
        out.push_str(&format!("\n{}{}\n", block.label(), marker));
        if block.entries.is_empty() {
            out.push_str("  (sin novedades)\n");
        }
        for entry in &block.entries {
            out.push_str(&format!(
                "  - {} ({})\n    {}\n    {}\n",
                entry.item.title, entry.item.source_name, entry.text, entry.item.url
            ));
        }
    }
    for failure in &digest.source_failures {
        out.push_str(&format!("! {}: {}\n", failure.source_id, failure.reason));
    }
    out
}
