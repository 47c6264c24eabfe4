use anyhow::Result;
use async_trait::async_trait;

use crate::types::LlmPolicy;

/// Black-box text-generation capability used for extraction and summaries.
///
/// Implementations may return structured JSON or free text; callers own the
/// job of recovering structure from the response.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openrouter", "ollama", "gemini").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmRequest {
    pub fn from_policy(
        policy: &LlmPolicy,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: policy.model.clone(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: policy.max_tokens,
            temperature: policy.temperature,
        }
    }
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_policy() {
        let policy = LlmPolicy {
            model: "gemini-1.5-flash".into(),
            max_tokens: 1024,
            temperature: 0.3,
        };
        let req = LlmRequest::from_policy(&policy, "system", "user");
        assert_eq!(req.model, "gemini-1.5-flash");
        assert_eq!(req.max_tokens, 1024);
        assert_eq!(req.user_prompt, "user");
    }
}
