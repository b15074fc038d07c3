//! URL resolution and canonicalization.

use reqwest::Url;

/// Resolve `raw` against `base` when relative, then canonicalize.
pub(crate) fn resolve_and_canonicalize(raw: &str, base: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty()
        || raw.starts_with('#')
        || raw.starts_with("mailto:")
        || raw.starts_with("javascript:")
    {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        canonicalize_url(raw)
    } else {
        let base_url = Url::parse(base).ok()?;
        let joined = base_url.join(raw).ok()?;
        canonicalize_url(joined.as_str())
    }
}

/// Canonical form used for identity: fragment and `utm_*` tracking
/// parameters removed, trailing slash trimmed. Scheme and host come back
/// lowercase from the parser. Non-http(s) URLs are rejected.
pub(crate) fn canonicalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

/// Return `endpoint` with query parameter `param` set to `value`.
pub(crate) fn with_query_param(endpoint: &str, param: &str, value: &str) -> Option<Url> {
    let mut url = Url::parse(endpoint).ok()?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, value);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment_and_tracking_params() {
        let url = canonicalize_url(
            "https://Example.COM/post/1/?utm_source=rss&utm_medium=feed&ref=home#comments",
        )
        .unwrap();
        assert_eq!(url, "https://example.com/post/1?ref=home");
    }

    #[test]
    fn drops_empty_query_after_filtering() {
        let url = canonicalize_url("https://example.com/a?utm_campaign=x").unwrap();
        assert_eq!(url, "https://example.com/a");
    }

    #[test]
    fn keeps_root_slash() {
        assert_eq!(
            canonicalize_url("https://example.com/").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(canonicalize_url("ftp://example.com/file").is_none());
        assert!(canonicalize_url("not a url").is_none());
    }

    #[test]
    fn resolves_relative_links() {
        let url =
            resolve_and_canonicalize("../news/item-7/", "https://example.com/blog/index.html");
        assert_eq!(url.as_deref(), Some("https://example.com/news/item-7"));
    }

    #[test]
    fn ignores_anchor_and_mailto_links() {
        assert!(resolve_and_canonicalize("#top", "https://example.com").is_none());
        assert!(resolve_and_canonicalize("mailto:a@b.c", "https://example.com").is_none());
    }

    #[test]
    fn with_query_param_replaces_existing_value() {
        let url = with_query_param("https://api.example.com/items?page=1&limit=5", "page", "3")
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?limit=5&page=3");
    }
}
