use thiserror::Error;

/// Why a whole source could not be fetched. Recorded per source, never fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("malformed {format} document: {reason}")]
    Malformed {
        format: &'static str,
        reason: String,
    },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Why a single fetched item was dropped. Logged and counted, never fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("item from {source_id} is missing required field '{field}'")]
    MissingField {
        source_id: String,
        field: &'static str,
    },

    #[error("item from {source_id} has an invalid {field}: {reason}")]
    InvalidField {
        source_id: String,
        field: &'static str,
        reason: String,
    },

    #[error("payload from {source_id} does not match parser '{parser}'")]
    PayloadMismatch {
        source_id: String,
        parser: &'static str,
    },
}
