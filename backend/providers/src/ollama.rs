use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tenantlens_core::{LlmProvider, LlmRequest, LlmResponse};

use crate::http::{chat_messages, check_status, client_with_timeout, ChatMessage};

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Local Ollama server. Keeps tenant documents on the machine.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: OLLAMA_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Local models on CPU can be slow; callers usually want a generous bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = client_with_timeout(timeout);
        self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatReply {
    message: ChatMessage,
    done_reason: Option<String>,
    #[serde(default)]
    eval_count: u64,
    #[serde(default)]
    prompt_eval_count: u64,
}

/// Hosted gateways prefix models with a vendor (`openai/...`); Ollama tags do not.
fn local_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let model = local_model_name(&request.model);

        let body = ChatBody {
            model,
            messages: chat_messages(request),
            stream: false,
            options: SamplingOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!(model, base_url = %self.base_url, "Sending request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Ollama HTTP request to {} failed", self.base_url))?;

        let reply: ChatReply = check_status("Ollama", response)
            .await?
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        if reply.done_reason.as_deref() == Some("length") {
            warn!(model, max_tokens = request.max_tokens, "Ollama reply hit the token limit");
        }

        Ok(LlmResponse {
            content: reply.message.content,
            provider: "ollama".to_string(),
            model: model.to_string(),
            tokens_used: reply.eval_count + reply.prompt_eval_count,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_prefix_stripped() {
        assert_eq!(local_model_name("meta-llama/llama3.1"), "llama3.1");
        assert_eq!(local_model_name("llama3.1"), "llama3.1");
    }

    #[test]
    fn reply_counts_both_token_kinds() {
        let raw = r#"{"message":{"role":"assistant","content":"ok"},"done_reason":"stop","eval_count":12,"prompt_eval_count":30}"#;
        let reply: ChatReply = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.eval_count + reply.prompt_eval_count, 42);
        assert_eq!(reply.message.content, "ok");
    }
}
