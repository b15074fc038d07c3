//! Cross-run deduplication, recency window, and per-source caps.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use infoia_core::{NewsItem, SeenIndex, SourceRegistry};

/// Drop items already in `seen` and repeated identities within `items`.
///
/// Order is preserved; the first occurrence of a repeated identity wins.
#[must_use]
pub fn filter_new(items: Vec<NewsItem>, seen: &SeenIndex) -> Vec<NewsItem> {
    let mut emitted = HashSet::new();
    items
        .into_iter()
        .filter(|item| !seen.contains(&item.id) && emitted.insert(item.id.clone()))
        .collect()
}

/// Limits applied after identity filtering.
#[derive(Debug, Clone, Default)]
pub struct DedupPolicy {
    /// Items published before `now - lookback` are dropped. `None` disables.
    pub lookback: Option<Duration>,
    pub default_cap: usize,
    /// Per-source overrides of `default_cap`.
    pub source_caps: HashMap<String, usize>,
}

impl DedupPolicy {
    /// Policy with the registry's per-source caps. A `lookback_hours` of 0
    /// disables the recency window.
    #[must_use]
    pub fn new(registry: &SourceRegistry, lookback_hours: u64, default_cap: usize) -> Self {
        let lookback = i64::try_from(lookback_hours)
            .ok()
            .filter(|h| *h > 0)
            .and_then(Duration::try_hours);
        Self {
            lookback,
            default_cap,
            source_caps: registry
                .list_sources()
                .iter()
                .filter_map(|s| Some((s.id.clone(), s.max_items?)))
                .collect(),
        }
    }

    fn cap_for(&self, source_id: &str) -> usize {
        self.source_caps
            .get(source_id)
            .copied()
            .unwrap_or(self.default_cap)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOutcome {
    pub items: Vec<NewsItem>,
    pub duplicates: usize,
    pub stale: usize,
    pub capped: usize,
}

/// Apply [`filter_new`], then the recency window, then per-source caps.
///
/// Items are expected in source-then-recency order, so the cap keeps each
/// source's newest new items.
#[must_use]
pub fn deduplicate(
    items: Vec<NewsItem>,
    seen: &SeenIndex,
    policy: &DedupPolicy,
    now: DateTime<Utc>,
) -> DedupOutcome {
    let total = items.len();
    let fresh = filter_new(items, seen);
    let duplicates = total - fresh.len();

    // A window reaching past the representable range keeps everything.
    let cutoff = policy
        .lookback
        .and_then(|window| now.checked_sub_signed(window));
    let before_window = fresh.len();
    let recent: Vec<NewsItem> = fresh
        .into_iter()
        .filter(|item| cutoff.is_none_or(|c| item.published_at >= c))
        .collect();
    let stale = before_window - recent.len();

    let mut per_source: HashMap<String, usize> = HashMap::new();
    let before_cap = recent.len();
    let items: Vec<NewsItem> = recent
        .into_iter()
        .filter(|item| {
            let count = per_source.entry(item.source_id.clone()).or_insert(0);
            *count += 1;
            *count <= policy.cap_for(&item.source_id)
        })
        .collect();
    let capped = before_cap - items.len();

    tracing::debug!(total, duplicates, stale, capped, kept = items.len(), "deduplicated");
    DedupOutcome {
        items,
        duplicates,
        stale,
        capped,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use infoia_core::{Category, ItemId};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).unwrap()
    }

    fn item(id: &str, source: &str, hours_ago: i64) -> NewsItem {
        NewsItem {
            id: ItemId::new(id),
            title: id.to_string(),
            excerpt: String::new(),
            url: format!("https://example.com/{id}"),
            author: None,
            published_at: now() - Duration::hours(hours_ago),
            source_id: source.to_string(),
            source_name: source.to_string(),
            category: Category::Industry,
        }
    }

    fn ids(items: &[NewsItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    fn policy(lookback_hours: i64, cap: usize) -> DedupPolicy {
        DedupPolicy {
            lookback: Duration::try_hours(lookback_hours).filter(|_| lookback_hours > 0),
            default_cap: cap,
            source_caps: HashMap::new(),
        }
    }

    #[test]
    fn filter_new_drops_seen_and_repeats_in_order() {
        let seen: SeenIndex = [(ItemId::new("b"), now())].into_iter().collect();
        let items = vec![
            item("a", "s", 1),
            item("b", "s", 1),
            item("c", "s", 1),
            item("a", "t", 1),
        ];
        assert_eq!(ids(&filter_new(items, &seen)), vec!["a", "c"]);
    }

    #[test]
    fn filter_new_is_idempotent_once_emitted_items_are_seen() {
        let items = vec![item("a", "s", 1), item("b", "s", 1)];
        let first = filter_new(items.clone(), &SeenIndex::new());
        let seen = SeenIndex::new().merged_with(first.iter().map(|i| &i.id), now());
        assert!(filter_new(items, &seen).is_empty());
    }

    #[test]
    fn stale_items_fall_outside_the_window() {
        let items = vec![item("fresh", "s", 2), item("old", "s", 30)];
        let out = deduplicate(items, &SeenIndex::new(), &policy(24, 10), now());
        assert_eq!(ids(&out.items), vec!["fresh"]);
        assert_eq!(out.stale, 1);
    }

    #[test]
    fn zero_lookback_keeps_everything() {
        let items = vec![item("ancient", "s", 24 * 365)];
        let out = deduplicate(items, &SeenIndex::new(), &policy(0, 10), now());
        assert_eq!(out.items.len(), 1);
    }

    #[test]
    fn huge_lookback_keeps_everything_instead_of_overflowing() {
        let registry = SourceRegistry::new(vec![]).unwrap();
        let p = DedupPolicy::new(&registry, 10_000_000_000, 10);
        let items = vec![item("ancient", "s", 24 * 365 * 50)];
        let out = deduplicate(items, &SeenIndex::new(), &p, now());
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.stale, 0);
    }

    #[test]
    fn cap_applies_per_source_with_overrides() {
        let mut p = policy(0, 2);
        p.source_caps.insert("busy".to_string(), 1);
        let items = vec![
            item("a1", "calm", 1),
            item("a2", "calm", 2),
            item("a3", "calm", 3),
            item("b1", "busy", 1),
            item("b2", "busy", 2),
        ];
        let out = deduplicate(items, &SeenIndex::new(), &p, now());
        assert_eq!(ids(&out.items), vec!["a1", "a2", "b1"]);
        assert_eq!(out.capped, 2);
    }

    #[test]
    fn seen_items_do_not_consume_the_cap() {
        let seen: SeenIndex = [(ItemId::new("a1"), now())].into_iter().collect();
        let items = vec![item("a1", "s", 1), item("a2", "s", 2), item("a3", "s", 3)];
        let out = deduplicate(items, &seen, &policy(0, 2), now());
        assert_eq!(ids(&out.items), vec!["a2", "a3"]);
        assert_eq!(out.duplicates, 1);
        assert_eq!(out.capped, 0);
    }
}
