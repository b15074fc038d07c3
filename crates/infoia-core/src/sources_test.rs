use super::*;

fn syndication(id: &str, category: Category) -> Source {
    Source {
        id: id.to_string(),
        name: format!("{id} feed"),
        endpoint: format!("https://{id}.example.com/feed.xml"),
        category,
        parser: ParserKind::Syndication,
        enabled: true,
        identity: IdentityStrategy::Url,
        max_items: None,
        timeout_secs: None,
    }
}

fn json_mapping() -> JsonMapping {
    JsonMapping {
        items: "/data".to_string(),
        title: "/title".to_string(),
        url: None,
        url_template: Some("https://example.com/p/{id}".to_string()),
        id: Some("/id".to_string()),
        summary: None,
        published: None,
        author: None,
        title_prefix: None,
        pagination: None,
    }
}

#[test]
fn builtin_registry_is_valid() {
    let registry = builtin_registry().expect("embedded registry should validate");
    assert!(registry.list_sources().len() >= 10);
    assert!(registry.get("xataka-ia").is_some());
    assert_eq!(
        registry.get("huggingface-papers").map(|s| s.category),
        Some(Category::Research)
    );
}

#[test]
fn builtin_registry_tracks_provider_changelogs() {
    let registry = builtin_registry().unwrap();
    let trackers: Vec<&Source> = registry
        .list_sources()
        .iter()
        .filter(|s| matches!(&s.parser, ParserKind::Html(rules) if !rules.keywords.is_empty()))
        .collect();
    assert_eq!(trackers.len(), 7);
    for source in trackers {
        assert_eq!(source.category, Category::Releases, "{}", source.id);
        assert_eq!(source.identity, IdentityStrategy::Title, "{}", source.id);
    }
    let Some(ParserKind::Html(rules)) = registry.get("gemini-changelog").map(|s| &s.parser) else {
        panic!("gemini-changelog should be an html source");
    };
    assert!(rules.keywords.iter().any(|k| k == "Gemini"));
}

#[test]
fn builtin_registry_covers_every_category() {
    let registry = builtin_registry().unwrap();
    let active = registry.active_categories();
    for category in Category::ALL {
        assert!(active.contains(&category), "no source for {category}");
    }
}

#[test]
fn parses_all_parser_kinds_from_yaml() {
    let yaml = r#"
sources:
  - id: feed
    name: Feed
    endpoint: https://example.com/rss
    category: lanzamientos
    parser:
      kind: syndication
  - id: api
    name: Api
    endpoint: https://example.com/api
    category: herramientas
    max_items: 3
    parser:
      kind: json_api
      items: /results
      title: /name
      url: /link
      pagination:
        param: page
  - id: page
    name: Page
    endpoint: https://example.com/
    category: benchmarks
    identity: title
    enabled: false
    parser:
      kind: html
"#;
    let registry = SourceRegistry::from_yaml(yaml).expect("valid registry");
    let sources = registry.list_sources();
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0].parser, ParserKind::Syndication);

    let ParserKind::JsonApi(mapping) = &sources[1].parser else {
        panic!("expected json_api, got {:?}", sources[1].parser);
    };
    assert_eq!(mapping.items, "/results");
    let pagination = mapping.pagination.as_ref().unwrap();
    assert_eq!(pagination.start, 1);
    assert_eq!(pagination.max_pages, 3);
    assert_eq!(sources[1].max_items, Some(3));

    assert_eq!(sources[2].parser, ParserKind::Html(HtmlRules::default()));
    assert_eq!(sources[2].identity, IdentityStrategy::Title);
    assert!(!sources[2].enabled);
    assert_eq!(registry.enabled_sources().count(), 2);
}

#[test]
fn unknown_category_fails_to_parse() {
    let yaml = r"
sources:
  - id: feed
    name: Feed
    endpoint: https://example.com/rss
    category: deportes
    parser:
      kind: syndication
";
    let err = SourceRegistry::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::RegistryParse(_)), "got {err:?}");
}

#[test]
fn rejects_duplicate_ids() {
    let err = SourceRegistry::new(vec![
        syndication("dup", Category::Industry),
        syndication("dup", Category::Research),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("duplicate source id"));
}

#[test]
fn rejects_non_slug_id() {
    let err = SourceRegistry::new(vec![syndication("Bad Id", Category::Industry)]).unwrap_err();
    assert!(err.to_string().contains("slug"));
}

#[test]
fn rejects_non_http_endpoint() {
    let mut source = syndication("ftp", Category::Industry);
    source.endpoint = "ftp://example.com/feed".to_string();
    let err = SourceRegistry::new(vec![source]).unwrap_err();
    assert!(err.to_string().contains("http(s) URL"));
}

#[test]
fn rejects_endpoint_without_host() {
    let mut source = syndication("nohost", Category::Industry);
    source.endpoint = "https:///feed".to_string();
    assert!(SourceRegistry::new(vec![source]).is_err());
}

#[test]
fn rejects_registry_with_nothing_enabled() {
    let mut source = syndication("off", Category::Industry);
    source.enabled = false;
    let err = SourceRegistry::new(vec![source]).unwrap_err();
    assert!(err.to_string().contains("enabled"));
}

#[test]
fn rejects_zero_max_items() {
    let mut source = syndication("capped", Category::Industry);
    source.max_items = Some(0);
    assert!(SourceRegistry::new(vec![source]).is_err());
}

#[test]
fn rejects_url_template_without_placeholder() {
    let mut mapping = json_mapping();
    mapping.url_template = Some("https://example.com/p/".to_string());
    let mut source = syndication("api", Category::Tools);
    source.parser = ParserKind::JsonApi(mapping);
    let err = SourceRegistry::new(vec![source]).unwrap_err();
    assert!(err.to_string().contains("{id}"), "got: {err}");
}

#[test]
fn rejects_url_template_without_id_pointer() {
    let mut mapping = json_mapping();
    mapping.id = None;
    let mut source = syndication("api", Category::Tools);
    source.parser = ParserKind::JsonApi(mapping);
    assert!(SourceRegistry::new(vec![source]).is_err());
}

#[test]
fn rejects_relative_json_pointer() {
    let mut mapping = json_mapping();
    mapping.title = "title".to_string();
    let mut source = syndication("api", Category::Tools);
    source.parser = ParserKind::JsonApi(mapping);
    let err = SourceRegistry::new(vec![source]).unwrap_err();
    assert!(err.to_string().contains("must start with '/'"));
}

#[test]
fn rejects_uncompilable_html_pattern() {
    let mut source = syndication("page", Category::Benchmarks);
    source.parser = ParserKind::Html(HtmlRules {
        item_pattern: Some("(<article".to_string()),
        ..HtmlRules::default()
    });
    let err = SourceRegistry::new(vec![source]).unwrap_err();
    assert!(err.to_string().contains("item_pattern"));
}

#[test]
fn rejects_blank_html_keyword() {
    let mut source = syndication("changelog", Category::Releases);
    source.parser = ParserKind::Html(HtmlRules {
        keywords: vec!["GPT".to_string(), "  ".to_string()],
        ..HtmlRules::default()
    });
    let err = SourceRegistry::new(vec![source]).unwrap_err();
    assert!(err.to_string().contains("keywords"));
}

#[test]
fn category_map_skips_disabled_sources() {
    let mut off = syndication("off", Category::Research);
    off.enabled = false;
    let registry = SourceRegistry::new(vec![syndication("on", Category::Releases), off]).unwrap();
    let map = registry.category_map();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("on"), Some(&Category::Releases));
    assert!(!registry.active_categories().contains(&Category::Research));
}

#[test]
fn select_keeps_registry_order_and_rejects_unknown_ids() {
    let registry = SourceRegistry::new(vec![
        syndication("a", Category::Industry),
        syndication("b", Category::Releases),
        syndication("c", Category::Research),
    ])
    .unwrap();

    let picked = registry
        .select(&["c".to_string(), "a".to_string()])
        .unwrap();
    let ids: Vec<&str> = picked.list_sources().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);

    let err = registry.select(&["zzz".to_string()]).unwrap_err();
    assert!(err.to_string().contains("unknown source id"));
}

#[test]
fn load_registry_reports_missing_file() {
    let err = load_registry(Path::new("/definitely/not/here.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::RegistryIo { .. }));
}
