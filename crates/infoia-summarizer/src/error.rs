use thiserror::Error;

/// Errors from a single call to the summarization service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The call did not complete within the configured timeout.
    #[error("summarization call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status other than an authentication rejection.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The service rejected the API key (401/403).
    #[error("summarization service rejected the API key (HTTP {status})")]
    Unauthorized { status: u16 },

    /// The response could not be parsed into per-item summaries.
    #[error("malformed summarization response: {0}")]
    Malformed(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Why a batch fell back to untranslated text.
#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("service still failing after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ServiceError,
    },

    #[error("service refused the request: {0}")]
    Rejected(#[source] ServiceError),

    #[error("unusable response: {0}")]
    Malformed(String),

    #[error("credentials rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("no summarization API key configured")]
    MissingApiKey,

    /// An earlier batch in this run hit a fatal error.
    #[error("summarizer disabled for this run: {0}")]
    Tripped(String),
}
