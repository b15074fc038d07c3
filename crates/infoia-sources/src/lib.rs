//! Source fetching and normalization for the infoia digest.
//!
//! [`Fetcher`] retrieves every enabled source concurrently and splits each
//! document into [`infoia_core::RawItem`]s: syndication feeds (RSS and Atom),
//! JSON APIs described by pointer mappings, and scraped HTML pages.
//! [`normalize`] turns each raw item into a validated
//! [`infoia_core::NewsItem`] with a stable identity.

pub mod error;
pub mod fetch;
pub mod identity;
pub mod normalize;

mod html;
mod json_api;
mod syndication;
mod urls;

pub use error::{FetchError, ParseError};
pub use fetch::{FetchConfig, FetchReport, Fetcher};
pub use identity::derive_identity;
pub use normalize::{
    normalize, normalize_source, parse_timestamp, NormalizedSource, EXCERPT_MAX_CHARS,
};
