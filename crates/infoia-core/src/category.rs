use serde::{Deserialize, Serialize};

/// The six fixed digest sections.
///
/// Declaration order is the order sections appear in every digest; the
/// derived `Ord` follows it, so a `BTreeMap<Category, _>` iterates in digest
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "industria")]
    Industry,
    #[serde(rename = "lanzamientos")]
    Releases,
    #[serde(rename = "benchmarks")]
    Benchmarks,
    #[serde(rename = "herramientas")]
    Tools,
    #[serde(rename = "espanol")]
    Spanish,
    #[serde(rename = "research")]
    Research,
}

impl Category {
    /// Every category, in digest order.
    pub const ALL: [Category; 6] = [
        Category::Industry,
        Category::Releases,
        Category::Benchmarks,
        Category::Tools,
        Category::Spanish,
        Category::Research,
    ];

    /// Registry key, as written in `sources.yaml`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Category::Industry => "industria",
            Category::Releases => "lanzamientos",
            Category::Benchmarks => "benchmarks",
            Category::Tools => "herramientas",
            Category::Spanish => "espanol",
            Category::Research => "research",
        }
    }

    /// Section heading shown to readers.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Industry => "📰 Noticias de Industria",
            Category::Releases => "🚀 Lanzamientos de Modelos",
            Category::Benchmarks => "📊 Benchmarks & Rankings",
            Category::Tools => "🛠️ Herramientas & APIs",
            Category::Spanish => "🇪🇸 En Español",
            Category::Research => "📄 Research & Papers",
        }
    }

    /// Parse a registry key. Returns `None` for anything outside the fixed set.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_sorted_in_declared_order() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
    }

    #[test]
    fn releases_precede_research() {
        assert!(Category::Releases < Category::Research);
    }

    #[test]
    fn key_round_trips_through_from_key() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert_eq!(Category::from_key("sports"), None);
    }

    #[test]
    fn serde_uses_registry_keys() {
        let yaml = serde_yaml::to_string(&Category::Spanish).unwrap();
        assert_eq!(yaml.trim(), "espanol");
        let parsed: Category = serde_yaml::from_str("lanzamientos").unwrap();
        assert_eq!(parsed, Category::Releases);
    }
}
