//! Batch request/response types and the chat-completions wire format.

use infoia_core::{Category, NewsItem};
use serde::{Deserialize, Serialize};

/// One item as presented to the summarization service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// 1-based position in the batch, echoed by line-format responses.
    pub index: usize,
    pub id: String,
    pub title: String,
    pub source: String,
    pub excerpt: String,
}

/// A bounded group of items from one category sent in a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub category: Category,
    pub items: Vec<BatchItem>,
    /// Upper bound on words per summary.
    pub max_words: usize,
}

impl BatchRequest {
    #[must_use]
    pub fn new(category: Category, items: &[NewsItem], max_words: usize) -> Self {
        Self {
            category,
            items: items
                .iter()
                .enumerate()
                .map(|(i, item)| BatchItem {
                    index: i + 1,
                    id: item.id.as_str().to_string(),
                    title: item.title.clone(),
                    source: item.source_name.clone(),
                    excerpt: item.excerpt.clone(),
                })
                .collect(),
            max_words,
        }
    }
}

/// A summary returned by the service, correlated by identity or by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: Option<String>,
    pub index: Option<usize>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    pub summaries: Vec<ItemSummary>,
}

// ---------------------------------------------------------------------------
// Chat completions wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
