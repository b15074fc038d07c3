//! Spanish summarization of category buckets through a chat-completions API.
//!
//! [`Summarizer`] batches each bucket, sends every batch through a
//! [`SummaryService`] with per-call timeout and bounded retry, and correlates
//! the answers back to items by identity. Failures never propagate: affected
//! items keep their untranslated excerpt and the block is marked `partial` or
//! `degraded`.

pub mod client;
pub mod error;
pub mod service;
pub mod summarizer;
pub mod types;

mod prompt;
mod retry;

pub use client::ChatCompletionsClient;
pub use error::{ServiceError, SummarizationError};
pub use service::SummaryService;
pub use summarizer::{CallOutcome, Summarizer, SummarizerConfig};
pub use types::{BatchItem, BatchRequest, BatchResponse, ItemSummary};
