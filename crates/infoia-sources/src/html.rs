//! HTML scraping helpers: block splitting, field extraction, and text cleanup.

use std::sync::LazyLock;

use infoia_core::HtmlRules;
use regex::Regex;

use crate::error::FetchError;

static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));
static SCRIPTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("valid script regex")
});
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>").expect("valid heading regex"));
static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a>").expect("valid anchor regex"));
static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)href\s*=\s*["']([^"']+)["']"#).expect("valid href regex"));
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid paragraph regex"));
static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<time[^>]*datetime\s*=\s*["']([^"']+)["']"#).expect("valid time regex")
});
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x?)([0-9a-fA-F]+);").expect("valid entity regex"));

const MIN_PARAGRAPH_LEN: usize = 20;

/// Cut a page into item blocks using the source's block pattern.
///
/// The first capture group is the block; patterns without groups use the
/// whole match. With `keywords` set, blocks whose text mentions none of
/// them are skipped.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the pattern does not compile.
pub(crate) fn split_blocks(html: &str, rules: &HtmlRules) -> Result<Vec<String>, FetchError> {
    let re = Regex::new(rules.item_pattern()).map_err(|e| FetchError::Malformed {
        format: "html",
        reason: format!("item pattern does not compile: {e}"),
    })?;
    let keywords: Vec<String> = rules.keywords.iter().map(|k| k.to_lowercase()).collect();
    let html = SCRIPTS.replace_all(html, " ");
    Ok(re
        .captures_iter(&html)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(0)))
        .map(|m| m.as_str().to_string())
        .filter(|block| !block.trim().is_empty())
        .filter(|block| mentions_any(block, &keywords))
        .collect())
}

fn mentions_any(block: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let text = clean_text(block).to_lowercase();
    keywords.iter().any(|k| text.contains(k.as_str()))
}

/// Fields found in one item block, before validation.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BlockFields {
    pub title: String,
    pub href: Option<String>,
    pub excerpt: String,
    pub published: Option<String>,
}

/// Extract title, link, excerpt, and timestamp from an item block.
///
/// The title comes from the first heading, else the first link text. The
/// link prefers one inside the heading.
pub(crate) fn extract_fields(fragment: &str) -> BlockFields {
    let mut fields = BlockFields::default();

    if let Some(heading) = HEADING.captures(fragment).and_then(|c| c.get(1)) {
        fields.title = clean_text(heading.as_str());
        fields.href = first_href(heading.as_str());
    }

    if fields.title.is_empty() {
        if let Some(cap) = ANCHOR.captures(fragment) {
            fields.title = clean_text(cap.get(2).map_or("", |m| m.as_str()));
            fields.href = cap.get(1).and_then(|m| first_href(m.as_str()));
        }
    }

    if fields.href.is_none() {
        fields.href = first_href(fragment);
    }

    fields.excerpt = PARAGRAPH
        .captures_iter(fragment)
        .filter_map(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
        .find(|p| p.chars().count() >= MIN_PARAGRAPH_LEN && *p != fields.title)
        .unwrap_or_default();

    fields.published = TIME
        .captures(fragment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    fields
}

fn first_href(html: &str) -> Option<String> {
    HREF.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|href| !href.is_empty())
}

/// Strip tags, decode common entities, and collapse whitespace.
pub(crate) fn clean_text(input: &str) -> String {
    let no_tags = TAGS.replace_all(input, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let numeric = NUMERIC_ENTITY.replace_all(input, |cap: &regex::Captures<'_>| {
        let radix = if cap[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&cap[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map_or_else(|| cap[0].to_string(), |c| c.to_string())
    });
    numeric
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
