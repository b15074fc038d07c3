//! Prompt construction and response parsing for Spanish batch summaries.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ServiceError;
use crate::types::{BatchRequest, ItemSummary};

pub(crate) const SYSTEM_PROMPT: &str = "Eres un periodista tecnológico especializado en \
inteligencia artificial. Resumes noticias en español de forma clara, precisa y neutral. \
Respondes siempre con JSON válido.";

/// Render the user message: instructions followed by the enumerated batch.
pub(crate) fn build_user_prompt(request: &BatchRequest) -> String {
    let mut prompt = format!(
        "Resume y traduce al español cada noticia en 2-3 frases y como máximo {} palabras. \
Mantén en inglés los nombres de productos, modelos y empresas. No inventes datos que no \
aparezcan en el texto.\n\
Responde solo con un objeto JSON con esta forma: \
{{\"items\":[{{\"id\":\"<id>\",\"summary\":\"<resumen>\"}}]}}, un elemento por noticia y \
con el mismo id.\n",
        request.max_words
    );
    for item in &request.items {
        prompt.push_str(&format!(
            "\n[{}] id={}\nTítulo: {}\nFuente: {}\n",
            item.index, item.id, item.title, item.source
        ));
        if !item.excerpt.is_empty() {
            prompt.push_str(&format!("Extracto: {}\n", item.excerpt));
        }
    }
    prompt
}

#[derive(Debug, Deserialize)]
struct WireSummaries {
    items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default, alias = "resumen", alias = "text")]
    summary: Option<String>,
}

/// Parse the model's reply into per-item summaries.
///
/// Accepts the requested JSON object (optionally wrapped in a Markdown code
/// fence) and falls back to the enumerated `[n] text` line format.
///
/// # Errors
///
/// Returns [`ServiceError::Malformed`] when neither format yields any summary.
pub(crate) fn parse_response(content: &str) -> Result<Vec<ItemSummary>, ServiceError> {
    let body = strip_code_fence(content);

    if let Ok(wire) = serde_json::from_str::<WireSummaries>(body) {
        let summaries: Vec<ItemSummary> = wire
            .items
            .into_iter()
            .filter_map(|item| {
                let text = item.summary?.trim().to_string();
                if text.is_empty() {
                    return None;
                }
                let id = item.id.and_then(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
                Some(ItemSummary {
                    id,
                    index: item.index,
                    text,
                })
            })
            .collect();
        if summaries.is_empty() {
            return Err(ServiceError::Malformed(
                "JSON response contains no summaries".to_string(),
            ));
        }
        return Ok(summaries);
    }

    let numbered = parse_numbered_lines(body);
    if numbered.is_empty() {
        return Err(ServiceError::Malformed(format!(
            "neither JSON nor numbered lines: {}",
            preview(body)
        )));
    }
    Ok(numbered)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// `[n] text` lines; unnumbered lines continue the previous entry.
fn parse_numbered_lines(body: &str) -> Vec<ItemSummary> {
    let mut out: Vec<ItemSummary> = Vec::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let numbered = line
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .and_then(|(n, text)| n.trim().parse::<usize>().ok().map(|n| (n, text.trim())));
        match (numbered, out.last_mut()) {
            (Some((index, text)), _) => out.push(ItemSummary {
                id: None,
                index: Some(index),
                text: text.to_string(),
            }),
            (None, Some(last)) => {
                last.text.push(' ');
                last.text.push_str(line);
            }
            (None, None) => {}
        }
    }
    out.retain(|s| !s.text.is_empty());
    out
}

fn preview(body: &str) -> String {
    body.chars().take(120).collect()
}
