//! HTTP plumbing shared by the remote providers.

use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use tenantlens_core::LlmRequest;

/// Longest error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// A client whose every round trip is bounded by `timeout`.
///
/// Returns the default client if the builder rejects the configuration.
pub(crate) fn client_with_timeout(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Pass successful responses through; turn anything else into an error
/// naming the provider, the status and the start of the body.
pub(crate) async fn check_status(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let mut body: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS + 1).collect();
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        body = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        body.push('…');
    }
    bail!("{provider} returned {status}: {body}")
}

/// One message in an OpenAI-style chat exchange.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// System prompt (when present) followed by the user prompt.
pub(crate) fn chat_messages(request: &LlmRequest) -> Vec<ChatMessage> {
    let system = (!request.system_prompt.is_empty()).then(|| ChatMessage {
        role: "system".to_string(),
        content: request.system_prompt.clone(),
    });
    system
        .into_iter()
        .chain(std::iter::once(ChatMessage {
            role: "user".to_string(),
            content: request.user_prompt.clone(),
        }))
        .collect()
}
