//! Per-category batching, outcome classification, and degraded fallback.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use infoia_core::{AppConfig, BlockStatus, CategoryBucket, NewsItem, SummaryBlock, SummaryEntry};

use crate::error::{ServiceError, SummarizationError};
use crate::retry::{is_retriable, retry_with_backoff};
use crate::service::SummaryService;
use crate::types::{BatchRequest, ItemSummary};

/// Tuning for [`Summarizer`].
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub batch_size: usize,
    /// Total attempts per batch, including the first.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    /// Timeout applied to every individual service call.
    pub call_timeout_secs: u64,
    /// Categories summarized concurrently.
    pub max_concurrent: usize,
    pub max_words: usize,
}

impl SummarizerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.llm_batch_size,
            max_attempts: config.llm_max_attempts,
            backoff_base_ms: config.llm_backoff_base_ms,
            call_timeout_secs: config.llm_timeout_secs,
            max_concurrent: config.llm_max_concurrent,
            max_words: config.summary_max_words,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            call_timeout_secs: 60,
            max_concurrent: 2,
            max_words: 50,
        }
    }
}

/// Result of one batch call after retries.
#[derive(Debug)]
pub enum CallOutcome {
    /// The service answered with usable summaries.
    Success(Vec<ItemSummary>),
    /// This batch falls back to untranslated text; later batches still try.
    Degraded(SummarizationError),
    /// The service can never succeed in this run; the summarizer trips.
    Fatal(SummarizationError),
}

/// Classify a finished (already retried) call.
fn classify(result: Result<Vec<ItemSummary>, ServiceError>, max_attempts: u32) -> CallOutcome {
    match result {
        Ok(summaries) => CallOutcome::Success(summaries),
        Err(ServiceError::Unauthorized { status }) => {
            CallOutcome::Fatal(SummarizationError::Unauthorized { status })
        }
        Err(ServiceError::Malformed(reason)) => {
            CallOutcome::Degraded(SummarizationError::Malformed(reason))
        }
        Err(err) if is_retriable(&err) => {
            CallOutcome::Degraded(SummarizationError::RetriesExhausted {
                attempts: max_attempts,
                source: err,
            })
        }
        Err(err) => CallOutcome::Degraded(SummarizationError::Rejected(err)),
    }
}

/// Condenses and translates category buckets through a [`SummaryService`].
///
/// Never fails: every error ends up as untranslated fallback text in a
/// `partial` or `degraded` block. Authentication failures (or a missing API
/// key) trip the summarizer so the rest of the run stops calling the service.
pub struct Summarizer {
    service: Option<Arc<dyn SummaryService>>,
    config: SummarizerConfig,
    tripped: OnceLock<String>,
}

impl Summarizer {
    #[must_use]
    pub fn new(service: Arc<dyn SummaryService>, config: SummarizerConfig) -> Self {
        Self {
            service: Some(service),
            config,
            tripped: OnceLock::new(),
        }
    }

    /// A summarizer with no service configured. Every block falls back to
    /// the original excerpts.
    #[must_use]
    pub fn disabled(config: SummarizerConfig) -> Self {
        Self {
            service: None,
            config,
            tripped: OnceLock::new(),
        }
    }

    /// The reason the summarizer stopped calling the service, if it has.
    #[must_use]
    pub fn tripped_reason(&self) -> Option<&str> {
        self.tripped.get().map(String::as_str)
    }

    /// Summarize every bucket, running up to `max_concurrent` categories at
    /// once. Blocks are returned in input order.
    pub async fn summarize_all<'b, I>(&self, buckets: I) -> Vec<SummaryBlock>
    where
        I: IntoIterator<Item = &'b CategoryBucket>,
    {
        stream::iter(buckets)
            .map(|bucket| self.summarize(bucket))
            .buffered(self.config.max_concurrent.max(1))
            .collect()
            .await
    }

    /// Summarize one category. Items keep their bucket order.
    pub async fn summarize(&self, bucket: &CategoryBucket) -> SummaryBlock {
        let mut block = SummaryBlock::empty(bucket.category);
        if bucket.is_empty() {
            return block;
        }

        let mut first_failure: Option<String> = None;
        for chunk in bucket.items.chunks(self.config.batch_size.max(1)) {
            let request = BatchRequest::new(bucket.category, chunk, self.config.max_words);
            match self.call_batch(&request).await {
                CallOutcome::Success(summaries) => {
                    let (entries, missing) = correlate(chunk, &summaries);
                    if missing > 0 {
                        tracing::warn!(
                            category = %bucket.category,
                            missing,
                            batch_size = chunk.len(),
                            "summaries missing from response, using original text"
                        );
                        first_failure.get_or_insert_with(|| {
                            format!("{missing} item(s) missing from the service response")
                        });
                    }
                    block.entries.extend(entries);
                }
                CallOutcome::Degraded(err) => {
                    tracing::warn!(
                        category = %bucket.category,
                        batch_size = chunk.len(),
                        error = %err,
                        "batch degraded to untranslated text"
                    );
                    first_failure.get_or_insert_with(|| err.to_string());
                    block.entries.extend(chunk.iter().map(fallback_entry));
                }
                CallOutcome::Fatal(err) => {
                    tracing::error!(
                        category = %bucket.category,
                        error = %err,
                        "summarizer disabled for the rest of the run"
                    );
                    let _ = self.tripped.set(err.to_string());
                    first_failure.get_or_insert_with(|| err.to_string());
                    block.entries.extend(chunk.iter().map(fallback_entry));
                }
            }
        }

        let translated = block.entries.iter().filter(|e| e.translated).count();
        block.status = if translated == block.entries.len() {
            BlockStatus::Complete
        } else if translated == 0 {
            BlockStatus::Degraded
        } else {
            BlockStatus::Partial
        };
        if block.status != BlockStatus::Complete {
            block.degraded_reason = first_failure;
        }
        tracing::info!(
            category = %bucket.category,
            items = block.entries.len(),
            translated,
            status = ?block.status,
            "category summarized"
        );
        block
    }

    /// Send one batch with per-call timeout and retry, then classify it.
    pub async fn call_batch(&self, request: &BatchRequest) -> CallOutcome {
        if let Some(reason) = self.tripped.get() {
            return CallOutcome::Degraded(SummarizationError::Tripped(reason.clone()));
        }
        let Some(service) = &self.service else {
            return CallOutcome::Fatal(SummarizationError::MissingApiKey);
        };

        let secs = self.config.call_timeout_secs;
        let result = retry_with_backoff(
            self.config.max_attempts.max(1),
            self.config.backoff_base_ms,
            move || async move {
                let response =
                    tokio::time::timeout(Duration::from_secs(secs), service.call(request))
                        .await
                        .map_err(|_| ServiceError::Timeout { secs })??;
                Ok(response.summaries)
            },
        )
        .await;
        classify(result, self.config.max_attempts.max(1))
    }
}

/// Pair each item with its summary by identity, then by its `[n]` number.
/// When neither matches anything but the counts agree, pair by position.
/// Returns the entries and how many items had no usable summary.
fn correlate(items: &[NewsItem], summaries: &[ItemSummary]) -> (Vec<SummaryEntry>, usize) {
    let by_id: HashMap<&str, &str> = summaries
        .iter()
        .filter_map(|s| Some((s.id.as_deref()?, s.text.as_str())))
        .collect();
    let by_index: HashMap<usize, &str> = summaries
        .iter()
        .filter_map(|s| Some((s.index?, s.text.as_str())))
        .collect();

    let keyed = |i: usize, item: &NewsItem| {
        by_id
            .get(item.id.as_str())
            .or_else(|| by_index.get(&(i + 1)))
            .copied()
    };
    let positional = summaries.len() == items.len()
        && items.iter().enumerate().all(|(i, item)| keyed(i, item).is_none());

    let mut missing = 0;
    let entries = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let text = keyed(i, item)
                .or_else(|| positional.then(|| summaries[i].text.as_str()))
                .map(str::trim)
                .filter(|t| !t.is_empty());
            match text {
                Some(text) => SummaryEntry {
                    item: item.clone(),
                    text: text.to_string(),
                    translated: true,
                },
                None => {
                    missing += 1;
                    fallback_entry(item)
                }
            }
        })
        .collect();
    (entries, missing)
}

/// Untranslated text for an item: its excerpt, or its title when empty.
fn fallback_entry(item: &NewsItem) -> SummaryEntry {
    let text = if item.excerpt.trim().is_empty() {
        item.title.clone()
    } else {
        item.excerpt.clone()
    };
    SummaryEntry {
        item: item.clone(),
        text,
        translated: false,
    }
}

#[cfg(test)]
#[path = "summarizer_test.rs"]
mod tests;
