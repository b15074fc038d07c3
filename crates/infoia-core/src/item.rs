use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Category;

/// Deterministic identity of a news item, used as the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields lifted out of one RSS `<item>` or Atom `<entry>`, still unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyndicationEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub published: Option<String>,
    pub author: Option<String>,
}

/// Source-native payload of a single fetched item.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Syndication(SyndicationEntry),
    Json(serde_json::Value),
    Html {
        /// Markup of one item block.
        fragment: String,
        /// Page the block was cut from; relative links resolve against it.
        page_url: String,
    },
}

/// One item as fetched, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub source_id: String,
    pub payload: RawPayload,
    pub fetched_at: DateTime<Utc>,
}

/// A normalized news item. Immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: ItemId,
    pub title: String,
    /// Original-language excerpt, HTML-free and length-bounded.
    pub excerpt: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_id: String,
    pub source_name: String,
    pub category: Category,
}
