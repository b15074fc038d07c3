//! One digest run: fetch, normalize, deduplicate, categorize, summarize,
//! assemble, then commit the digest and the grown seen index together.
//!
//! Everything before the commit only reads shared state, so a run that is
//! cancelled or fails early leaves the database exactly as it found it.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use infoia_core::{
    builtin_registry, load_registry, AppConfig, ConfigError, Digest, SeenIndex, Source,
    SourceRegistry,
};
use infoia_db::{DigestStore, PersistenceError};
use infoia_sources::{normalize_source, Fetcher};
use infoia_summarizer::Summarizer;
use thiserror::Error;

use crate::assemble::assemble;
use crate::categorize::categorize;
use crate::dedup::{deduplicate, DedupPolicy};
use crate::export::export_digest;

/// Where a run is, or where it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Fetching,
    Normalizing,
    Deduplicating,
    Categorizing,
    Summarizing,
    Assembling,
    Committed,
    Failed,
}

impl RunState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Normalizing => "normalizing",
            RunState::Deduplicating => "deduplicating",
            RunState::Categorizing => "categorizing",
            RunState::Summarizing => "summarizing",
            RunState::Assembling => "assembling",
            RunState::Committed => "committed",
            RunState::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Committed | RunState::Failed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end a run without a commit.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("run cancelled while {state}")]
    Cancelled { state: RunState },
}

/// Load the registry at `path`, or the built-in one when `None`.
///
/// # Errors
///
/// Returns [`RunError::Configuration`] if the registry cannot be read,
/// parsed, or validated.
pub fn load_sources(path: Option<&Path>) -> Result<SourceRegistry, RunError> {
    let registry = match path {
        Some(path) => load_registry(path)?,
        None => builtin_registry()?,
    };
    Ok(registry)
}

/// Per-run knobs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 0 disables the recency window.
    pub lookback_hours: u64,
    pub max_items_per_source: usize,
    /// Stop after assembling; nothing is committed or exported.
    pub dry_run: bool,
    pub export_dir: Option<PathBuf>,
}

impl RunOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            lookback_hours: config.lookback_hours,
            max_items_per_source: config.max_items_per_source,
            dry_run: false,
            export_dir: config.export_dir.clone(),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            max_items_per_source: 10,
            dry_run: false,
            export_dir: None,
        }
    }
}

/// Counters gathered across the stages of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub sources: usize,
    pub failed_sources: usize,
    pub fetched: usize,
    pub parse_errors: usize,
    pub duplicates: usize,
    pub stale: usize,
    pub capped: usize,
    pub unmapped: usize,
    pub emitted: usize,
    /// Categories where every entry fell back to the untranslated excerpt.
    pub degraded_categories: usize,
    /// Categories where only some entries fell back.
    pub partial_categories: usize,
}

#[derive(Debug)]
pub struct RunReport {
    pub digest: Digest,
    /// `Committed`, or `Assembling` for a dry run.
    pub state: RunState,
    pub stats: RunStats,
    /// Set when the digest was exported after the commit.
    pub export_path: Option<PathBuf>,
}

struct Prepared {
    digest: Digest,
    seen: SeenIndex,
    stats: RunStats,
}

#[derive(Default)]
struct Progress(Mutex<RunState>);

impl Progress {
    fn advance(&self, next: RunState) {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(from = %*state, to = %next, "run state");
        *state = next;
    }

    fn current(&self) -> RunState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The wired-up pipeline. Cheap to run repeatedly against the same store.
pub struct Pipeline {
    registry: SourceRegistry,
    fetcher: Fetcher,
    summarizer: Summarizer,
    store: Arc<DigestStore>,
    options: RunOptions,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        registry: SourceRegistry,
        fetcher: Fetcher,
        summarizer: Summarizer,
        store: Arc<DigestStore>,
        options: RunOptions,
    ) -> Self {
        Self {
            registry,
            fetcher,
            summarizer,
            store,
            options,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &Arc<DigestStore> {
        &self.store
    }

    /// Run once to completion unless `cancel` resolves first.
    ///
    /// Cancellation is honoured up to the end of assembly. The commit itself
    /// is never interrupted, and an export failure after it is only logged.
    ///
    /// # Errors
    ///
    /// - [`RunError::Persistence`] if the seen index cannot be loaded or the
    ///   commit fails; nothing is written in either case.
    /// - [`RunError::Cancelled`] if `cancel` resolved before the commit.
    pub async fn run<C>(&self, cancel: C) -> Result<RunReport, RunError>
    where
        C: Future<Output = ()>,
    {
        let progress = Progress::default();
        let generated_at = Utc::now();

        let prepared = tokio::select! {
            biased;
            () = cancel => {
                let state = progress.current();
                tracing::warn!(%state, "run cancelled, nothing committed");
                return Err(RunError::Cancelled { state });
            }
            result = self.prepare(&progress, generated_at) => result,
        };
        let Prepared {
            digest,
            seen,
            stats,
        } = prepared.inspect_err(|e| {
            progress.advance(RunState::Failed);
            tracing::error!(error = %e, "run failed");
        })?;

        if self.options.dry_run {
            tracing::info!(items = digest.item_count(), "dry run, skipping commit");
            return Ok(RunReport {
                digest,
                state: progress.current(),
                stats,
                export_path: None,
            });
        }

        let grown = seen.merged_with(digest.item_ids(), generated_at);
        if let Err(e) = self.store.commit_run(&digest, &grown).await {
            progress.advance(RunState::Failed);
            tracing::error!(error = %e, "commit failed, seen index unchanged");
            return Err(e.into());
        }
        progress.advance(RunState::Committed);

        let export_path = match &self.options.export_dir {
            Some(dir) => match export_digest(&digest, dir).await {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(error = %e, "digest export failed");
                    None
                }
            },
            None => None,
        };

        tracing::info!(
            run_id = %digest.run_id,
            edition = %digest.edition,
            emitted = stats.emitted,
            failed_sources = stats.failed_sources,
            degraded_categories = stats.degraded_categories,
            partial_categories = stats.partial_categories,
            "digest run committed"
        );

        Ok(RunReport {
            digest,
            state: progress.current(),
            stats,
            export_path,
        })
    }

    async fn prepare(
        &self,
        progress: &Progress,
        generated_at: DateTime<Utc>,
    ) -> Result<Prepared, RunError> {
        let seen = self.store.load_seen_index().await?;
        let mut stats = RunStats::default();

        progress.advance(RunState::Fetching);
        let sources: Vec<&Source> = self.registry.enabled_sources().collect();
        stats.sources = sources.len();
        let report = self.fetcher.fetch_all(&sources).await;
        stats.failed_sources = report.failures.len();
        if !sources.is_empty() && report.fetched.is_empty() {
            tracing::warn!(sources = sources.len(), "every source failed to fetch");
        }

        progress.advance(RunState::Normalizing);
        let mut items = Vec::new();
        for (source, raw) in report.fetched {
            stats.fetched += raw.len();
            let normalized = normalize_source(source, raw);
            stats.parse_errors += normalized.errors.len();
            items.extend(normalized.items);
        }

        progress.advance(RunState::Deduplicating);
        let policy = DedupPolicy::new(
            &self.registry,
            self.options.lookback_hours,
            self.options.max_items_per_source,
        );
        let deduped = deduplicate(items, &seen, &policy, generated_at);
        stats.duplicates = deduped.duplicates;
        stats.stale = deduped.stale;
        stats.capped = deduped.capped;

        progress.advance(RunState::Categorizing);
        let categorized = categorize(deduped.items, &self.registry.category_map());
        stats.unmapped = categorized.unmapped;

        progress.advance(RunState::Summarizing);
        let blocks = self
            .summarizer
            .summarize_all(categorized.buckets.values())
            .await;
        stats.degraded_categories = blocks.iter().filter(|b| b.is_degraded()).count();
        stats.partial_categories = blocks.iter().filter(|b| b.is_partial()).count();
        if let Some(reason) = self.summarizer.tripped_reason() {
            tracing::warn!(reason, "summarizer disabled during run");
        }

        progress.advance(RunState::Assembling);
        let digest = assemble(blocks, generated_at, report.failures);
        stats.emitted = digest.item_count();

        Ok(Prepared {
            digest,
            seen,
            stats,
        })
    }
}
