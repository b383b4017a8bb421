use crate::error::{Error, Result};
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::time::Duration;

/// Narrow seam over the text-completion service. Everything above this trait
/// treats the oracle as an opaque prompt-in/text-out collaborator.
pub trait Oracle: Send + Sync {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Gemini `generateContent` client. Transport failures get one retry with a
/// short backoff; schema problems in the returned text are never retried
/// here, that is the callers' decision.
#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    api_key: String,
    model: String,
}

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

impl GeminiService {
    pub fn new(api_key: String, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.7,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 2048
            }
        });

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| Error::AiTransport(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::AiTransport(format!(
                "completion API error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res
            .json()
            .await
            .map_err(|e| Error::AiTransport(e.to_string()))?;

        body.get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::AiFormat("completion response carried no text part".to_string()))
    }
}

impl Oracle for GeminiService {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.generate(prompt).await {
            Err(Error::AiTransport(first)) => {
                tracing::warn!(error = %first, "oracle transport error, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.generate(prompt).await
            }
            other => other,
        }
    }
}

/// Extract a single JSON value from oracle output: fenced ```json blocks,
/// raw JSON, or JSON buried in surrounding prose. Anything else is a hard
/// format failure.
pub fn parse_json_payload(text: &str) -> Result<JsonValue> {
    let trimmed = text.trim();
    let candidate = extract_fenced(trimmed).unwrap_or(trimmed);

    if let Ok(value) = serde_json::from_str(candidate) {
        return Ok(value);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (candidate.find(open), candidate.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str(&candidate[start..=end]) {
                    return Ok(value);
                }
            }
        }
    }

    Err(Error::AiFormat(format!(
        "oracle output is not parseable JSON: {}",
        truncate_for_log(trimmed)
    )))
}

fn extract_fenced(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let rest = &text[start + 3..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

fn truncate_for_log(text: &str) -> &str {
    let cut = text
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..cut]
}
