//! Integration tests for `Fetcher` using wiremock HTTP mocks.

use std::time::Duration;

use infoia_core::{
    Category, HtmlRules, IdentityStrategy, JsonMapping, Pagination, ParserKind, RawPayload, Source,
};
use infoia_sources::{normalize_source, FetchConfig, FetchError, Fetcher};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>Lab Blog</title>
  <item>
    <title>Model X released</title>
    <link>https://lab.example.com/model-x</link>
    <description>Our fastest model yet.</description>
    <pubDate>Tue, 03 Mar 2026 09:30:00 GMT</pubDate>
  </item>
  <item>
    <title>Safety report</title>
    <link>https://lab.example.com/safety</link>
    <pubDate>Mon, 02 Mar 2026 09:30:00 GMT</pubDate>
  </item>
</channel></rss>"#;

fn source(id: &str, endpoint: String, parser: ParserKind) -> Source {
    Source {
        id: id.to_string(),
        name: id.to_string(),
        endpoint,
        category: Category::Releases,
        parser,
        enabled: true,
        identity: IdentityStrategy::Url,
        max_items: None,
        timeout_secs: None,
    }
}

fn fetcher(config: FetchConfig) -> Fetcher {
    Fetcher::new(config).expect("fetcher construction should not fail")
}

fn models_mapping(pagination: Option<Pagination>) -> JsonMapping {
    JsonMapping {
        items: "/data".to_string(),
        title: "/name".to_string(),
        url: None,
        url_template: Some("https://models.example.com/{id}".to_string()),
        id: Some("/id".to_string()),
        summary: None,
        published: None,
        author: None,
        title_prefix: None,
        pagination,
    }
}

#[tokio::test]
async fn rss_feed_is_split_into_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
        .mount(&server)
        .await;

    let src = source(
        "lab-blog",
        format!("{}/feed.xml", server.uri()),
        ParserKind::Syndication,
    );
    let items = fetcher(FetchConfig::default())
        .fetch(&src)
        .await
        .expect("feed should be fetched");

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.source_id == "lab-blog"));
    assert!(matches!(&items[0].payload, RawPayload::Syndication(e)
        if e.title.as_deref() == Some("Model X released")));

    let normalized = normalize_source(&src, items);
    assert!(normalized.errors.is_empty());
    assert_eq!(normalized.items[0].url, "https://lab.example.com/model-x");
}

#[tokio::test]
async fn json_api_follows_pages_until_empty() {
    let server = MockServer::start().await;
    let page = |n: &str, body: serde_json::Value| {
        Mock::given(method("GET"))
            .and(path("/api/models"))
            .and(query_param("page", n))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
    };
    page("1", serde_json::json!({"data": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}]}))
        .mount(&server)
        .await;
    page("2", serde_json::json!({"data": [{"id": "c", "name": "C"}]}))
        .mount(&server)
        .await;
    page("3", serde_json::json!({"data": []}))
        .mount(&server)
        .await;

    let src = source(
        "models",
        format!("{}/api/models?sort=new", server.uri()),
        ParserKind::JsonApi(models_mapping(Some(Pagination {
            param: "page".to_string(),
            start: 1,
            max_pages: 5,
        }))),
    );
    let items = fetcher(FetchConfig::default()).fetch(&src).await.unwrap();
    assert_eq!(items.len(), 3);

    let normalized = normalize_source(&src, items);
    let urls: Vec<&str> = normalized.items.iter().map(|i| i.url.as_str()).collect();
    assert!(urls.contains(&"https://models.example.com/c"));
}

#[tokio::test]
async fn json_api_stops_at_max_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/models"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"data": [{"id": "a", "name": "A"}]})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let src = source(
        "models",
        format!("{}/api/models", server.uri()),
        ParserKind::JsonApi(models_mapping(Some(Pagination {
            param: "p".to_string(),
            start: 0,
            max_pages: 2,
        }))),
    );
    let items = fetcher(FetchConfig::default()).fetch(&src).await.unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn html_page_is_split_into_blocks() {
    let server = MockServer::start().await;
    let page = r#"<html><body>
        <article><h2><a href="/posts/one">First post about agents</a></h2></article>
        <article><h2><a href="/posts/two">Second post about evals</a></h2></article>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/blog/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let endpoint = format!("{}/blog/", server.uri());
    let src = source(
        "scraped",
        endpoint.clone(),
        ParserKind::Html(HtmlRules::default()),
    );
    let items = fetcher(FetchConfig::default()).fetch(&src).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(matches!(
        &items[0].payload,
        RawPayload::Html { page_url, .. } if *page_url == endpoint
    ));

    let normalized = normalize_source(&src, items);
    assert_eq!(
        normalized.items[0].url,
        format!("{}/posts/one", server.uri())
    );
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let src = source("down", format!("{}/feed", server.uri()), ParserKind::Syndication);
    let err = fetcher(FetchConfig::default()).fetch(&src).await.unwrap_err();
    assert!(matches!(err, FetchError::UnexpectedStatus { status: 503, .. }));
}

#[tokio::test]
async fn slow_source_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(RSS)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut src = source("slow", format!("{}/feed", server.uri()), ParserKind::Syndication);
    src.timeout_secs = Some(1);
    let err = fetcher(FetchConfig::default()).fetch(&src).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { secs: 1 }));
}

#[tokio::test]
async fn source_timeout_can_exceed_global_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(RSS)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = FetchConfig {
        timeout_secs: 1,
        ..FetchConfig::default()
    };
    let mut patient = source("arxiv", format!("{}/feed", server.uri()), ParserKind::Syndication);
    patient.timeout_secs = Some(5);
    let items = fetcher(config.clone())
        .fetch(&patient)
        .await
        .expect("override should allow the slow response");
    assert_eq!(items.len(), 2);

    let hasty = source("default", format!("{}/feed", server.uri()), ParserKind::Syndication);
    let err = fetcher(config).fetch(&hasty).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { secs: 1 }));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
        .mount(&server)
        .await;

    let config = FetchConfig {
        max_body_bytes: 64,
        ..FetchConfig::default()
    };
    let src = source("big", format!("{}/feed", server.uri()), ParserKind::Syndication);
    let err = fetcher(config).fetch(&src).await.unwrap_err();
    assert!(matches!(err, FetchError::BodyTooLarge { limit: 64 }));
}

#[tokio::test]
async fn malformed_feed_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a feed</html>"))
        .mount(&server)
        .await;

    let src = source("broken", format!("{}/feed", server.uri()), ParserKind::Syndication);
    let err = fetcher(FetchConfig::default()).fetch(&src).await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed { format: "xml", .. }));
}

#[tokio::test]
async fn fetch_all_isolates_failing_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/good.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bad.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let first = source("first", format!("{}/good.xml", server.uri()), ParserKind::Syndication);
    let bad = source("bad", format!("{}/bad.xml", server.uri()), ParserKind::Syndication);
    let last = source("last", format!("{}/good.xml", server.uri()), ParserKind::Syndication);

    let report = fetcher(FetchConfig::default())
        .fetch_all(&[&first, &bad, &last])
        .await;

    let ids: Vec<&str> = report.fetched.iter().map(|(s, _)| s.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "last"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source_id, "bad");
    assert!(report.failures[0].reason.contains("500"));
}
