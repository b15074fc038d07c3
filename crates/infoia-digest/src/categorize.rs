//! Deterministic assignment of items to their source's category.

use std::collections::BTreeMap;

use infoia_core::{Category, CategoryBucket, NewsItem};

/// Source id to declared category, for enabled sources only.
pub type CategoryMap = BTreeMap<String, Category>;

/// Result of [`categorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorized {
    /// One bucket per category present in the map, in digest order.
    pub buckets: BTreeMap<Category, CategoryBucket>,
    /// Items dropped because their source is unmapped or disagrees with it.
    pub unmapped: usize,
}

/// Group `items` by their source's declared category.
///
/// Every category with at least one mapped source gets a bucket, even an
/// empty one. Items keep their input order within a bucket. An item whose
/// source is missing from `map`, or whose recorded category differs from the
/// mapped one, is dropped with a warning.
#[must_use]
pub fn categorize(items: Vec<NewsItem>, map: &CategoryMap) -> Categorized {
    let mut buckets: BTreeMap<Category, CategoryBucket> = map
        .values()
        .map(|&category| (category, CategoryBucket::new(category)))
        .collect();
    let mut unmapped = 0;

    for item in items {
        match map.get(&item.source_id) {
            Some(&category) if category == item.category => {
                if let Some(bucket) = buckets.get_mut(&category) {
                    bucket.items.push(item);
                }
            }
            Some(&category) => {
                tracing::warn!(
                    source = %item.source_id,
                    item = %item.id,
                    recorded = %item.category,
                    mapped = %category,
                    "category mismatch, dropping item"
                );
                unmapped += 1;
            }
            None => {
                tracing::warn!(
                    source = %item.source_id,
                    item = %item.id,
                    "source has no category mapping, dropping item"
                );
                unmapped += 1;
            }
        }
    }

    Categorized { buckets, unmapped }
}
