//! HTTP client for OpenAI-compatible chat-completions APIs.
//!
//! Sends one enumerated batch per request with a JSON-object response format
//! and maps authentication failures to [`ServiceError::Unauthorized`] so the
//! summarizer can stop calling a service that will never accept the key.

use std::time::Duration;

use async_trait::async_trait;
use infoia_core::AppConfig;
use reqwest::{Client, StatusCode, Url};

use crate::error::ServiceError;
use crate::prompt::{build_user_prompt, parse_response, SYSTEM_PROMPT};
use crate::service::SummaryService;
use crate::types::{
    BatchRequest, BatchResponse, ChatMessage, ChatRequest, ChatResponse, ResponseFormat,
};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_MODEL: &str = "deepseek-chat";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 1_000;
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Client for a chat-completions endpoint (`POST {base}/chat/completions`).
///
/// Use [`ChatCompletionsClient::new`] for the default provider or
/// [`ChatCompletionsClient::with_base_url`] to point at another compatible
/// API or a mock server in tests.
pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl ChatCompletionsClient {
    /// Creates a client for the default provider and model.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        Self::with_base_url(api_key, DEFAULT_MODEL, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom model and base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ServiceError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("infoia/0.1 (news-digest)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|u| u.join("chat/completions"))
            .map_err(|e| ServiceError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    /// Builds a client from the application config, or `None` when no API
    /// key is configured.
    ///
    /// # Errors
    ///
    /// Same as [`ChatCompletionsClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, ServiceError> {
        config
            .llm_api_key
            .as_deref()
            .map(|key| {
                Self::with_base_url(
                    key,
                    &config.llm_model,
                    config.llm_timeout_secs,
                    &config.llm_base_url,
                )
            })
            .transpose()
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SummaryService for ChatCompletionsClient {
    /// # Errors
    ///
    /// - [`ServiceError::Unauthorized`] on HTTP 401 or 403.
    /// - [`ServiceError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ServiceError::Http`] on network failure.
    /// - [`ServiceError::Malformed`] if the envelope or the content cannot
    ///   be parsed.
    async fn call(&self, request: &BatchRequest) -> Result<BatchResponse, ServiceError> {
        let user_prompt = build_user_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ServiceError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::UnexpectedStatus {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
            });
        }

        let text = response.text().await?;
        let envelope: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ServiceError::Malformed(format!("chat completion envelope: {e}")))?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ServiceError::Malformed("response has no message content".to_string()))?;

        Ok(BatchResponse {
            summaries: parse_response(&content)?,
        })
    }
}
