use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tenantlens_core::{LlmProvider, LlmRequest, LlmResponse};

use crate::http::{chat_messages, check_status, client_with_timeout, ChatMessage};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Sent as `X-Title` so requests are attributed on the OpenRouter dashboard.
const APP_TITLE: &str = "TenantLens";

/// OpenAI-compatible chat-completions provider (OpenRouter by default).
///
/// Any endpoint speaking the `/chat/completions` dialect works by overriding
/// the base URL, e.g. `https://api.openai.com/v1`.
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENROUTER_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = client_with_timeout(timeout);
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
    usage: Option<ReplyUsage>,
}

#[derive(Deserialize)]
struct ReplyChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ReplyUsage {
    total_tokens: Option<u64>,
}

impl CompletionReply {
    /// Text of the first choice and whether it was cut off by the token limit.
    fn into_text(self) -> (String, bool) {
        match self.choices.into_iter().next() {
            Some(choice) => {
                let truncated = choice.finish_reason.as_deref() == Some("length");
                (choice.message.content, truncated)
            }
            None => (String::new(), false),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();

        let body = CompletionBody {
            model: &request.model,
            messages: chat_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            model = %request.model,
            prompt_chars = request.user_prompt.chars().count(),
            "Sending request to OpenRouter"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await
            .context("OpenRouter HTTP request failed")?;

        let reply: CompletionReply = check_status("OpenRouter", response)
            .await?
            .json()
            .await
            .context("Failed to parse OpenRouter response")?;

        let tokens_used = reply
            .usage
            .as_ref()
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);
        let (content, truncated) = reply.into_text();
        if truncated {
            // A cut-off reply usually means unparseable JSON downstream.
            warn!(
                model = %request.model,
                max_tokens = request.max_tokens,
                "OpenRouter reply hit the token limit"
            );
        }

        Ok(LlmResponse {
            content,
            provider: "openrouter".to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenRouterProvider::new("key").with_base_url("https://api.openai.com/v1/");
        assert_eq!(provider.completions_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn reply_without_usage() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"clauses\":[]}"},"finish_reason":"stop"}]}"#;
        let reply: CompletionReply = serde_json::from_str(raw).unwrap();
        assert!(reply.usage.is_none());
        assert_eq!(reply.into_text(), ("{\"clauses\":[]}".to_string(), false));
    }

    #[test]
    fn length_finish_marks_truncation() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"clauses\": ["},"finish_reason":"length"}],"usage":{"total_tokens":2048}}"#;
        let reply: CompletionReply = serde_json::from_str(raw).unwrap();
        let (_, truncated) = reply.into_text();
        assert!(truncated);
    }

    #[test]
    fn empty_choices_yield_empty_text() {
        let reply: CompletionReply = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(reply.into_text(), (String::new(), false));
    }
}
