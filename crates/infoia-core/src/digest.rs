use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, ItemId, NewsItem};

/// Identities already emitted by earlier runs, with their first-seen time.
///
/// Loaded once at run start and treated as read-only; a run produces a new
/// value through [`SeenIndex::merged_with`] instead of mutating in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenIndex {
    entries: BTreeMap<ItemId, DateTime<Utc>>,
}

impl SeenIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn first_seen(&self, id: &ItemId) -> Option<DateTime<Utc>> {
        self.entries.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &DateTime<Utc>)> {
        self.entries.iter()
    }

    /// Returns a copy of this index with `ids` added at `seen_at`.
    ///
    /// Identities already present keep their original first-seen time.
    #[must_use]
    pub fn merged_with<'a, I>(&self, ids: I, seen_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        let mut entries = self.entries.clone();
        for id in ids {
            entries.entry(id.clone()).or_insert(seen_at);
        }
        Self { entries }
    }
}

impl FromIterator<(ItemId, DateTime<Utc>)> for SeenIndex {
    fn from_iter<T: IntoIterator<Item = (ItemId, DateTime<Utc>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Items routed to one category, in source-then-recency order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBucket {
    pub category: Category,
    pub items: Vec<NewsItem>,
}

impl CategoryBucket {
    #[must_use]
    pub fn new(category: Category) -> Self {
        Self {
            category,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    /// Every entry carries summarized text.
    Complete,
    /// Some entries fell back to the original excerpt.
    Partial,
    /// Every entry fell back to the original excerpt.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub item: NewsItem,
    pub text: String,
    /// `false` when `text` is the untranslated fallback.
    pub translated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBlock {
    pub category: Category,
    pub status: BlockStatus,
    pub entries: Vec<SummaryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

impl SummaryBlock {
    /// A block with no entries.
    #[must_use]
    pub fn empty(category: Category) -> Self {
        Self {
            category,
            status: BlockStatus::Complete,
            entries: Vec::new(),
            degraded_reason: None,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    /// Every entry fell back to the untranslated excerpt.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.status == BlockStatus::Degraded
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.status == BlockStatus::Partial
    }
}

/// A source whose fetch failed during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source_id: String,
    pub reason: String,
}

/// The assembled output of one run and the input contract for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// UTC calendar date of `generated_at`.
    pub edition: NaiveDate,
    pub blocks: Vec<SummaryBlock>,
    #[serde(default)]
    pub source_failures: Vec<SourceFailure>,
}

impl Digest {
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.blocks.iter().map(|b| b.entries.len()).sum()
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.blocks
            .iter()
            .flat_map(|b| b.entries.iter().map(|e| &e.item.id))
    }

    #[must_use]
    pub fn block(&self, category: Category) -> Option<&SummaryBlock> {
        self.blocks.iter().find(|b| b.category == category)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn merged_with_keeps_original_first_seen() {
        let a = ItemId::new("a");
        let b = ItemId::new("b");
        let index: SeenIndex = [(a.clone(), ts(1))].into_iter().collect();

        let merged = index.merged_with([&a, &b], ts(5));

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.first_seen(&a), Some(ts(1)));
        assert_eq!(merged.first_seen(&b), Some(ts(5)));
        assert_eq!(index.len(), 1, "source index must be left untouched");
    }

    #[test]
    fn empty_block_is_complete() {
        let block = SummaryBlock::empty(Category::Research);
        assert!(!block.is_degraded());
        assert_eq!(block.label(), "📄 Research & Papers");
    }

    #[test]
    fn partial_block_is_not_degraded() {
        let mut block = SummaryBlock::empty(Category::Research);
        block.status = BlockStatus::Partial;
        assert!(block.is_partial());
        assert!(!block.is_degraded());

        block.status = BlockStatus::Degraded;
        assert!(!block.is_partial());
        assert!(block.is_degraded());
    }
}
