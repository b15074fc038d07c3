//! HTTP fetching with per-source timeouts and failure isolation.

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use infoia_core::{AppConfig, JsonMapping, ParserKind, RawItem, RawPayload, Source, SourceFailure};
use reqwest::{Client, Url};

use crate::error::FetchError;
use crate::{html, json_api, syndication, urls};

/// Settings for the [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_concurrent: usize,
    pub max_body_bytes: usize,
    pub user_agent: String,
}

impl FetchConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.fetch_timeout_secs,
            max_concurrent: config.fetch_max_concurrent,
            max_body_bytes: config.fetch_max_body_bytes,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_concurrent: 8,
            max_body_bytes: 10 * 1024 * 1024,
            user_agent: "infoia/0.1 (news-digest)".to_string(),
        }
    }
}

/// Items fetched from every source that succeeded, plus the failures.
#[derive(Debug)]
pub struct FetchReport<'s> {
    /// Successful sources in registry order.
    pub fetched: Vec<(&'s Source, Vec<RawItem>)>,
    pub failures: Vec<SourceFailure>,
}

/// Retrieves raw items from sources over HTTP.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch one source and split its document into raw items.
    ///
    /// The whole fetch, including every page of a paginated API, is bounded
    /// by the source's timeout, which may be longer or shorter than the
    /// global one.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] if the source does not answer in time.
    /// - [`FetchError::Http`] on transport failure.
    /// - [`FetchError::UnexpectedStatus`] on a non-2xx status.
    /// - [`FetchError::BodyTooLarge`] if the body exceeds the size limit.
    /// - [`FetchError::Malformed`] if the document cannot be split.
    pub async fn fetch(&self, source: &Source) -> Result<Vec<RawItem>, FetchError> {
        let secs = source.timeout_secs.unwrap_or(self.config.timeout_secs);
        tokio::time::timeout(Duration::from_secs(secs), self.fetch_unbounded(source, secs))
            .await
            .map_err(|_| FetchError::Timeout { secs })?
    }

    /// Fetch every source concurrently, isolating failures.
    ///
    /// A failing source is logged and recorded in the report; it never stops
    /// the others.
    pub async fn fetch_all<'s>(&self, sources: &[&'s Source]) -> FetchReport<'s> {
        let results: Vec<(&'s Source, Result<Vec<RawItem>, FetchError>)> = stream::iter(sources)
            .map(|&source| async move { (source, self.fetch(source).await) })
            .buffered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut report = FetchReport {
            fetched: Vec::with_capacity(results.len()),
            failures: Vec::new(),
        };
        for (source, result) in results {
            match result {
                Ok(items) => {
                    tracing::debug!(source = %source.id, count = items.len(), "fetched source");
                    report.fetched.push((source, items));
                }
                Err(e) => {
                    tracing::warn!(source = %source.id, error = %e, "source fetch failed");
                    report.failures.push(SourceFailure {
                        source_id: source.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }

    async fn fetch_unbounded(
        &self,
        source: &Source,
        secs: u64,
    ) -> Result<Vec<RawItem>, FetchError> {
        let fetched_at = Utc::now();
        let endpoint = parse_url(&source.endpoint)?;
        let raw = |payload| RawItem {
            source_id: source.id.clone(),
            payload,
            fetched_at,
        };

        match &source.parser {
            ParserKind::Syndication => {
                let body = self.get_text(endpoint, secs).await?;
                Ok(syndication::split_feed(&body)?
                    .into_iter()
                    .map(|entry| raw(RawPayload::Syndication(entry)))
                    .collect())
            }
            ParserKind::JsonApi(mapping) => {
                let values = self.fetch_json_pages(source, mapping, secs).await?;
                Ok(values.into_iter().map(|v| raw(RawPayload::Json(v))).collect())
            }
            ParserKind::Html(rules) => {
                let body = self.get_text(endpoint, secs).await?;
                Ok(html::split_blocks(&body, rules)?
                    .into_iter()
                    .map(|fragment| {
                        raw(RawPayload::Html {
                            fragment,
                            page_url: source.endpoint.clone(),
                        })
                    })
                    .collect())
            }
        }
    }

    /// Request successive pages until one comes back empty or `max_pages`
    /// is reached. Unpaginated sources make a single request.
    async fn fetch_json_pages(
        &self,
        source: &Source,
        mapping: &JsonMapping,
        secs: u64,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        let Some(pagination) = &mapping.pagination else {
            let body = self.get_text(parse_url(&source.endpoint)?, secs).await?;
            return json_api::split_items(&body, mapping);
        };

        let mut items = Vec::new();
        for offset in 0..pagination.max_pages {
            let page = pagination.start + u64::from(offset);
            let url = urls::with_query_param(&source.endpoint, &pagination.param, &page.to_string())
                .ok_or_else(|| FetchError::InvalidUrl {
                    url: source.endpoint.clone(),
                    reason: "cannot add page parameter".to_string(),
                })?;
            let body = self.get_text(url, secs).await?;
            let page_items = json_api::split_items(&body, mapping)?;
            tracing::debug!(source = %source.id, page, count = page_items.len(), "fetched page");
            if page_items.is_empty() {
                break;
            }
            items.extend(page_items);
        }
        Ok(items)
    }

    /// GET `url`, require a 2xx status, and return the body as text.
    ///
    /// The body is read chunk by chunk and rejected as soon as it passes
    /// `max_body_bytes`, whether or not a `Content-Length` was sent.
    async fn get_text(&self, url: Url, secs: u64) -> Result<String, FetchError> {
        let as_fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout { secs }
            } else {
                FetchError::Http(e)
            }
        };
        let mut response = self
            .client
            .get(url.clone())
            .timeout(Duration::from_secs(secs))
            .send()
            .await
            .map_err(as_fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Content-Length is advisory; the running total is what counts.
        let limit = self.config.max_body_bytes;
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(as_fetch_error)? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn parse_url(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
