//! Conversion of source-native payloads into [`NewsItem`]s.
//!
//! Each parser kind has its own extraction rules; all of them end in the
//! same validation and identity derivation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use infoia_core::{
    HtmlRules, IdentityStrategy, JsonMapping, NewsItem, ParserKind, RawItem, RawPayload, Source,
    SyndicationEntry,
};
use serde_json::Value;

use crate::error::ParseError;
use crate::html::{clean_text, extract_fields};
use crate::identity::derive_identity;
use crate::json_api::{authors_at, string_at};
use crate::urls::{canonicalize_url, resolve_and_canonicalize};

/// Upper bound on excerpt length, in characters.
pub const EXCERPT_MAX_CHARS: usize = 500;

/// Fields common to every parser kind, before validation.
struct Draft {
    title: String,
    link: Option<String>,
    excerpt: String,
    published: Option<String>,
    author: Option<String>,
}

/// Normalize one fetched item.
///
/// # Errors
///
/// Returns a [`ParseError`] when the item lacks a title or a usable link, or
/// when the payload does not match the source's parser kind. Callers drop
/// the item and continue.
pub fn normalize(source: &Source, raw: RawItem) -> Result<NewsItem, ParseError> {
    let fetched_at = raw.fetched_at;
    match (&source.parser, raw.payload) {
        (ParserKind::Syndication, RawPayload::Syndication(entry)) => {
            finish(source, syndication_draft(entry), &source.endpoint, fetched_at)
        }
        (ParserKind::JsonApi(mapping), RawPayload::Json(value)) => {
            let draft = json_draft(source, mapping, &value)?;
            finish(source, draft, &source.endpoint, fetched_at)
        }
        (ParserKind::Html(rules), RawPayload::Html { fragment, page_url }) => {
            let draft = html_draft(&fragment);
            let item = finish(source, draft, &page_url, fetched_at)?;
            apply_html_rules(source, rules, item)
        }
        (parser, _) => Err(ParseError::PayloadMismatch {
            source_id: source.id.clone(),
            parser: parser.name(),
        }),
    }
}

/// Result of normalizing everything fetched from one source.
#[derive(Debug, Default)]
pub struct NormalizedSource {
    /// Items ordered newest first; ties keep document order.
    pub items: Vec<NewsItem>,
    pub errors: Vec<ParseError>,
}

/// Normalize every item of one source, dropping and logging the ones that fail.
#[must_use]
pub fn normalize_source(source: &Source, raw_items: Vec<RawItem>) -> NormalizedSource {
    let mut out = NormalizedSource::default();
    for raw in raw_items {
        match normalize(source, raw) {
            Ok(item) => out.items.push(item),
            Err(e) => {
                tracing::warn!(source = %source.id, error = %e, "dropping unparseable item");
                out.errors.push(e);
            }
        }
    }
    out.items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    out
}

fn syndication_draft(entry: SyndicationEntry) -> Draft {
    let link = entry.link.or_else(|| {
        entry
            .guid
            .filter(|g| g.starts_with("http://") || g.starts_with("https://"))
    });
    let excerpt = entry
        .summary
        .or(entry.content)
        .map(|s| clean_text(&s))
        .unwrap_or_default();

    Draft {
        title: entry.title.map(|t| clean_text(&t)).unwrap_or_default(),
        link,
        excerpt,
        published: entry.published,
        author: entry.author.map(|a| clean_text(&a)).filter(|a| !a.is_empty()),
    }
}

fn json_draft(source: &Source, mapping: &JsonMapping, item: &Value) -> Result<Draft, ParseError> {
    let mut title = string_at(item, &mapping.title)
        .map(|t| clean_text(&t))
        .unwrap_or_default();
    if let Some(prefix) = &mapping.title_prefix {
        if !title.is_empty() {
            title = format!("{prefix}{title}");
        }
    }

    let link = match (&mapping.url, &mapping.url_template) {
        (Some(pointer), _) => string_at(item, pointer),
        (None, Some(template)) => {
            let id_pointer = mapping.id.as_deref().unwrap_or("/id");
            let id = string_at(item, id_pointer).ok_or_else(|| ParseError::MissingField {
                source_id: source.id.clone(),
                field: "id",
            })?;
            Some(template.replace("{id}", &id))
        }
        (None, None) => None,
    };

    Ok(Draft {
        title,
        link,
        excerpt: mapping
            .summary
            .as_deref()
            .and_then(|p| string_at(item, p))
            .map(|s| clean_text(&s))
            .unwrap_or_default(),
        published: mapping.published.as_deref().and_then(|p| string_at(item, p)),
        author: mapping.author.as_deref().and_then(|p| authors_at(item, p)),
    })
}

fn html_draft(fragment: &str) -> Draft {
    let fields = extract_fields(fragment);
    Draft {
        title: fields.title,
        link: fields.href,
        excerpt: fields.excerpt,
        published: fields.published,
        author: None,
    }
}

fn apply_html_rules(
    source: &Source,
    rules: &HtmlRules,
    item: NewsItem,
) -> Result<NewsItem, ParseError> {
    let title_chars = item.title.chars().count();
    if title_chars < rules.min_title_chars {
        return Err(ParseError::InvalidField {
            source_id: source.id.clone(),
            field: "title",
            reason: format!(
                "{title_chars} characters, fewer than the required {}",
                rules.min_title_chars
            ),
        });
    }
    if let Some(needle) = &rules.link_contains {
        if !item.url.contains(needle.as_str()) {
            return Err(ParseError::InvalidField {
                source_id: source.id.clone(),
                field: "url",
                reason: format!("'{}' does not contain '{needle}'", item.url),
            });
        }
    }
    Ok(item)
}

fn finish(
    source: &Source,
    draft: Draft,
    base_url: &str,
    fetched_at: DateTime<Utc>,
) -> Result<NewsItem, ParseError> {
    if draft.title.is_empty() {
        return Err(ParseError::MissingField {
            source_id: source.id.clone(),
            field: "title",
        });
    }

    let url = match draft.link {
        Some(link) => {
            resolve_and_canonicalize(&link, base_url).ok_or_else(|| ParseError::InvalidField {
                source_id: source.id.clone(),
                field: "url",
                reason: format!("'{link}' is not an http(s) URL"),
            })?
        }
        None if source.identity == IdentityStrategy::Title => canonicalize_url(base_url)
            .ok_or_else(|| ParseError::MissingField {
                source_id: source.id.clone(),
                field: "url",
            })?,
        None => {
            return Err(ParseError::MissingField {
                source_id: source.id.clone(),
                field: "url",
            })
        }
    };

    let published_at = draft
        .published
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(fetched_at);

    Ok(NewsItem {
        id: derive_identity(&source.id, source.identity, &url, &draft.title),
        title: draft.title,
        excerpt: truncate_chars(&draft.excerpt, EXCERPT_MAX_CHARS),
        url,
        author: draft.author,
        published_at,
        source_id: source.id.clone(),
        source_name: source.name.clone(),
        category: source.category,
    })
}

/// Parse the timestamp formats seen in feeds and APIs: RFC 3339, RFC 2822,
/// naive ISO date-times (taken as UTC), and bare dates.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
