//! Shared domain types for the infoia digest pipeline.
//!
//! Holds the fixed category set, the source registry, the item and digest
//! data model, and application configuration loading.

mod app_config;
mod category;
mod config;
mod digest;
mod error;
mod item;
mod sources;

pub use app_config::AppConfig;
pub use category::Category;
pub use config::{load_app_config, load_app_config_from_env};
pub use digest::{
    BlockStatus, CategoryBucket, Digest, SeenIndex, SourceFailure, SummaryBlock, SummaryEntry,
};
pub use error::ConfigError;
pub use item::{ItemId, NewsItem, RawItem, RawPayload, SyndicationEntry};
pub use sources::{
    builtin_registry, load_registry, HtmlRules, IdentityStrategy, JsonMapping, Pagination,
    ParserKind, Source, SourceRegistry, DEFAULT_HTML_ITEM_PATTERN,
};
