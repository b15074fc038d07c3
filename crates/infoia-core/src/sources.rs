use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Category, ConfigError};

/// Block pattern used by HTML sources that do not set `item_pattern`.
pub const DEFAULT_HTML_ITEM_PATTERN: &str = r"(?is)<article\b[^>]*>(.*?)</article>";

const BUILTIN_REGISTRY: &str = include_str!("../../../config/sources.yaml");

/// How an item's identity is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    /// Hash of source id and canonical URL.
    #[default]
    Url,
    /// Hash of source id and normalized title, for sources with unstable URLs.
    Title,
}

/// Page-parameter pagination for JSON APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Query parameter carrying the page number.
    pub param: String,
    #[serde(default = "default_page_start")]
    pub start: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_page_start() -> u64 {
    1
}

fn default_max_pages() -> u32 {
    3
}

/// Field mapping for a JSON API source. Every field is a JSON pointer
/// (RFC 6901) relative to one item, except `items`, which points at the item
/// array inside the response document (empty for a top-level array).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonMapping {
    #[serde(default)]
    pub items: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Link built from an item field, e.g. `https://huggingface.co/papers/{id}`.
    #[serde(default)]
    pub url_template: Option<String>,
    /// Pointer to the value substituted for `{id}` in `url_template`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title_prefix: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Extraction rules for an HTML page without a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlRules {
    /// Regex whose first capture group is one item block.
    pub item_pattern: Option<String>,
    /// Only keep items whose link contains this substring.
    pub link_contains: Option<String>,
    /// Drop items whose title is shorter than this many characters.
    pub min_title_chars: usize,
    /// Keep only blocks whose text mentions one of these, ignoring case.
    /// Empty keeps every block.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl HtmlRules {
    #[must_use]
    pub fn item_pattern(&self) -> &str {
        self.item_pattern
            .as_deref()
            .unwrap_or(DEFAULT_HTML_ITEM_PATTERN)
    }
}

/// Closed set of native formats a source can speak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParserKind {
    /// RSS 2.0 or Atom.
    Syndication,
    JsonApi(JsonMapping),
    Html(HtmlRules),
}

impl ParserKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ParserKind::Syndication => "syndication",
            ParserKind::JsonApi(_) => "json_api",
            ParserKind::Html(_) => "html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    pub category: Category,
    pub parser: ParserKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub identity: IdentityStrategy,
    /// Overrides the global per-source item cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Overrides the global fetch timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

/// The validated, ordered catalog of sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Build a registry from an explicit list, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any entry is malformed.
    pub fn new(sources: Vec<Source>) -> Result<Self, ConfigError> {
        let registry = Self { sources };
        validate_registry(&registry)?;
        Ok(registry)
    }

    /// Parse and validate a registry document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegistryParse`] for invalid YAML (including an
    /// unknown category key) and [`ConfigError::Validation`] for entries that
    /// parse but are malformed.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let registry: SourceRegistry = serde_yaml::from_str(content)?;
        validate_registry(&registry)?;
        Ok(registry)
    }

    /// All sources in registry order, enabled or not.
    #[must_use]
    pub fn list_sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter().filter(|s| s.enabled)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Source id to declared category, for enabled sources.
    #[must_use]
    pub fn category_map(&self) -> BTreeMap<String, Category> {
        self.enabled_sources()
            .map(|s| (s.id.clone(), s.category))
            .collect()
    }

    /// Categories with at least one enabled source.
    #[must_use]
    pub fn active_categories(&self) -> BTreeSet<Category> {
        self.enabled_sources().map(|s| s.category).collect()
    }

    /// Keep only the sources whose ids are listed. Unknown ids are an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if an id is not in the registry or
    /// the selection leaves no enabled source.
    pub fn select(&self, ids: &[String]) -> Result<Self, ConfigError> {
        for id in ids {
            if self.get(id).is_none() {
                return Err(ConfigError::Validation(format!("unknown source id '{id}'")));
            }
        }
        let sources = self
            .sources
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect();
        Self::new(sources)
    }
}

/// Load and validate the source registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_registry(path: &Path) -> Result<SourceRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegistryIo {
        path: path.display().to_string(),
        source: e,
    })?;
    SourceRegistry::from_yaml(&content)
}

/// The registry compiled into the binary from `config/sources.yaml`.
///
/// # Errors
///
/// Returns `ConfigError` if the embedded document fails validation.
pub fn builtin_registry() -> Result<SourceRegistry, ConfigError> {
    SourceRegistry::from_yaml(BUILTIN_REGISTRY)
}

fn validate_registry(registry: &SourceRegistry) -> Result<(), ConfigError> {
    if registry.sources.is_empty() {
        return Err(ConfigError::Validation(
            "registry must contain at least one source".to_string(),
        ));
    }
    if !registry.sources.iter().any(|s| s.enabled) {
        return Err(ConfigError::Validation(
            "registry must contain at least one enabled source".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for source in &registry.sources {
        validate_source(source)?;
        if !seen_ids.insert(source.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id: '{}'",
                source.id
            )));
        }
    }

    Ok(())
}

fn validate_source(source: &Source) -> Result<(), ConfigError> {
    let invalid =
        |reason: String| ConfigError::Validation(format!("source '{}': {reason}", source.id));

    if !is_slug(&source.id) {
        return Err(ConfigError::Validation(format!(
            "source id '{}' must be a non-empty lowercase slug",
            source.id
        )));
    }
    if source.name.trim().is_empty() {
        return Err(invalid("name must be non-empty".to_string()));
    }
    if !is_http_url(&source.endpoint) {
        return Err(invalid(format!(
            "endpoint '{}' must be an absolute http(s) URL",
            source.endpoint
        )));
    }
    if source.max_items == Some(0) {
        return Err(invalid("max_items must be at least 1".to_string()));
    }
    if source.timeout_secs == Some(0) {
        return Err(invalid("timeout_secs must be at least 1".to_string()));
    }

    match &source.parser {
        ParserKind::Syndication => Ok(()),
        ParserKind::JsonApi(mapping) => validate_json_mapping(mapping).map_err(invalid),
        ParserKind::Html(rules) => {
            if rules.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(invalid("keywords must be non-empty".to_string()));
            }
            Regex::new(rules.item_pattern())
                .map(|_| ())
                .map_err(|e| invalid(format!("item_pattern does not compile: {e}")))
        }
    }
}

fn validate_json_mapping(mapping: &JsonMapping) -> Result<(), String> {
    let pointers = [
        ("items", Some(mapping.items.as_str())),
        ("title", Some(mapping.title.as_str())),
        ("url", mapping.url.as_deref()),
        ("id", mapping.id.as_deref()),
        ("summary", mapping.summary.as_deref()),
        ("published", mapping.published.as_deref()),
        ("author", mapping.author.as_deref()),
    ];
    for (field, pointer) in pointers {
        if let Some(p) = pointer {
            if !p.is_empty() && !p.starts_with('/') {
                return Err(format!("{field} pointer '{p}' must start with '/'"));
            }
        }
    }
    if mapping.title.is_empty() {
        return Err("title pointer must be set".to_string());
    }

    match (&mapping.url, &mapping.url_template) {
        (None, None) => return Err("one of url or url_template must be set".to_string()),
        (Some(_), Some(_)) => return Err("url and url_template are mutually exclusive".to_string()),
        (None, Some(template)) => {
            if !template.contains("{id}") {
                return Err(format!("url_template '{template}' must contain {{id}}"));
            }
            if mapping.id.is_none() {
                return Err("url_template requires an id pointer".to_string());
            }
        }
        (Some(_), None) => {}
    }

    if let Some(pagination) = &mapping.pagination {
        if pagination.param.trim().is_empty() {
            return Err("pagination param must be non-empty".to_string());
        }
        if pagination.max_pages == 0 {
            return Err("pagination max_pages must be at least 1".to_string());
        }
    }

    Ok(())
}

fn is_slug(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn is_http_url(raw: &str) -> bool {
    let rest = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !raw.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
