//! Plain-language lease summary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use tenantlens_core::{LlmPolicy, LlmProvider, LlmRequest};

/// Only the start of the document is summarized.
pub const DEFAULT_SUMMARY_INPUT_CHARS: usize = 4000;

pub const SUMMARY_TEMPERATURE: f32 = 0.3;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful legal assistant who explains things simply.";

pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    policy: LlmPolicy,
    input_chars: usize,
    timeout: Duration,
}

impl Summarizer {
    /// Uses `policy`'s model and token limit with the summary temperature.
    pub fn new(provider: Arc<dyn LlmProvider>, policy: LlmPolicy) -> Self {
        Self {
            provider,
            policy: LlmPolicy {
                temperature: SUMMARY_TEMPERATURE,
                ..policy
            },
            input_chars: DEFAULT_SUMMARY_INPUT_CHARS,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_input_chars(mut self, chars: usize) -> Self {
        self.input_chars = chars;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Summarize the leading part of `text`. Failures become the summary text.
    pub async fn summarize(&self, text: &str, language: &str) -> String {
        let head = leading_chars(text, self.input_chars);
        let request = LlmRequest::from_policy(
            &self.policy,
            SUMMARY_SYSTEM_PROMPT,
            summary_prompt(head, language),
        );

        match tokio::time::timeout(self.timeout, self.provider.complete(&request)).await {
            Ok(Ok(response)) => {
                debug!(
                    provider = %response.provider,
                    input_chars = head.chars().count(),
                    "Generated summary"
                );
                response.content
            }
            Ok(Err(e)) => {
                warn!(error = %format!("{e:#}"), "Summary generation failed");
                format!("Error generating summary: {e}")
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Summary generation timed out");
                format!(
                    "Error generating summary: timed out after {}s",
                    self.timeout.as_secs()
                )
            }
        }
    }
}

/// Prefix of `text` holding at most `n` chars.
fn leading_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

fn summary_prompt(text: &str, language: &str) -> String {
    format!(
        r#"You are helping low-income renters understand their lease agreements.
Summarize this lease document in plain, simple language that a 6th grader could understand.
Write the entire summary in the language with code "{language}".

Focus on:
- Key terms and conditions
- Important dates and deadlines
- What the tenant needs to know
- Any red flags or concerns

Keep it under 300 words.

Lease document:
{text}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantlens_providers::MockProvider;

    #[test]
    fn test_leading_chars() {
        assert_eq!(leading_chars("héllo", 2), "hé");
        assert_eq!(leading_chars("abc", 10), "abc");
        assert_eq!(leading_chars("", 3), "");
    }

    #[tokio::test]
    async fn test_summary_uses_prefix_and_low_temperature() {
        let provider = MockProvider::new("mock").with_handler(|req| {
            assert!((req.temperature - 0.3).abs() < f32::EPSILON);
            assert!(req.user_prompt.contains(&"a".repeat(4000)));
            assert!(!req.user_prompt.contains(&"a".repeat(4001)));
            Ok("A simple summary.".to_string())
        });
        let summarizer = Summarizer::new(Arc::new(provider), LlmPolicy::default());
        let summary = summarizer.summarize(&"a".repeat(9000), "en").await;
        assert_eq!(summary, "A simple summary.");
    }

    #[tokio::test]
    async fn test_failure_becomes_summary_text() {
        let provider = MockProvider::new("mock").with_handler(|_| anyhow::bail!("quota exceeded"));
        let summarizer = Summarizer::new(Arc::new(provider), LlmPolicy::default());
        let summary = summarizer.summarize("lease text", "en").await;
        assert_eq!(summary, "Error generating summary: quota exceeded");
    }
}
