//! Clause and rights extraction for one chunk of lease text.
//!
//! Each extractor makes one model call per chunk and recovers structured
//! findings from the reply. Nothing here returns an error: provider failures
//! and timeouts yield no findings, unparseable replies yield one placeholder,
//! and both mark the outcome as degraded.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use tenantlens_core::{
    ClauseFinding, LeaseError, LlmPolicy, LlmProvider, LlmRequest, RightFinding, TextChunk,
};
use tenantlens_logging::excerpt;

use crate::json_recovery::recover_json;

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

const CLAUSE_SYSTEM_PROMPT: &str =
    "You are a helpful tenant rights lawyer. ONLY respond with valid JSON, no extra text.";

const RIGHTS_SYSTEM_PROMPT: &str =
    "You are a tenant rights expert. ONLY respond with valid JSON, no extra text.";

/// Findings from one chunk, plus whether they are trustworthy.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    pub findings: Vec<T>,
    /// The call failed, timed out, or its reply could not be parsed.
    pub degraded: bool,
}

impl<T> Extraction<T> {
    fn ok(findings: Vec<T>) -> Self {
        Self {
            findings,
            degraded: false,
        }
    }

    fn degraded(findings: Vec<T>) -> Self {
        Self {
            findings,
            degraded: true,
        }
    }
}

/// A finding type that can be pulled out of a model's JSON reply.
trait Finding: DeserializeOwned {
    /// Top-level key holding the findings array.
    const KEY: &'static str;

    fn placeholder() -> Self;
}

impl Finding for ClauseFinding {
    const KEY: &'static str = "clauses";

    fn placeholder() -> Self {
        ClauseFinding::parse_failure_placeholder()
    }
}

impl Finding for RightFinding {
    const KEY: &'static str = "rights";

    fn placeholder() -> Self {
        RightFinding::parse_failure_placeholder()
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Finds potentially unfair, illegal or problematic clauses.
pub struct ClauseExtractor {
    provider: Arc<dyn LlmProvider>,
    policy: LlmPolicy,
    timeout: Duration,
}

impl ClauseExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: LlmPolicy) -> Self {
        Self {
            provider,
            policy,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn extract(&self, chunk: &TextChunk, language: &str) -> Extraction<ClauseFinding> {
        let request = LlmRequest::from_policy(
            &self.policy,
            CLAUSE_SYSTEM_PROMPT,
            clause_prompt(&chunk.text, language),
        );
        run_extraction(self.provider.as_ref(), &request, self.timeout, chunk.index).await
    }
}

/// Finds tenant rights, obligations and deadlines.
pub struct RightsExtractor {
    provider: Arc<dyn LlmProvider>,
    policy: LlmPolicy,
    timeout: Duration,
}

impl RightsExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: LlmPolicy) -> Self {
        Self {
            provider,
            policy,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn extract(&self, chunk: &TextChunk, language: &str) -> Extraction<RightFinding> {
        let request = LlmRequest::from_policy(
            &self.policy,
            RIGHTS_SYSTEM_PROMPT,
            rights_prompt(&chunk.text, language),
        );
        run_extraction(self.provider.as_ref(), &request, self.timeout, chunk.index).await
    }
}

async fn run_extraction<T: Finding>(
    provider: &dyn LlmProvider,
    request: &LlmRequest,
    timeout: Duration,
    chunk: usize,
) -> Extraction<T> {
    let response = match tokio::time::timeout(timeout, provider.complete(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            let err = LeaseError::Provider {
                provider: provider.name().to_string(),
                message: format!("{e:#}"),
            };
            warn!(chunk, kind = T::KEY, error = %err, "Extraction call failed");
            return Extraction::degraded(Vec::new());
        }
        Err(_) => {
            warn!(chunk, kind = T::KEY, timeout_secs = timeout.as_secs(), "Extraction call timed out");
            return Extraction::degraded(Vec::new());
        }
    };

    debug!(
        chunk,
        kind = T::KEY,
        provider = %response.provider,
        tokens = response.tokens_used,
        latency_ms = response.latency_ms,
        "Extraction call completed"
    );

    match recover_json(&response.content) {
        Ok((value, source)) => {
            debug!(chunk, kind = T::KEY, ?source, "Recovered structured output");
            Extraction::ok(findings_from_value(&value, chunk))
        }
        Err(e) => {
            let err = LeaseError::ExtractionParseFailure {
                chunk,
                message: format!("{e:#}"),
            };
            warn!(
                kind = T::KEY,
                error = %err,
                response = %excerpt(&response.content, 200),
                "Using placeholder finding"
            );
            Extraction::degraded(vec![T::placeholder()])
        }
    }
}

/// Deserialize each element of `value[T::KEY]`, skipping malformed entries.
fn findings_from_value<T: Finding>(value: &Value, chunk: usize) -> Vec<T> {
    let Some(items) = value.get(T::KEY).and_then(Value::as_array) else {
        debug!(chunk, kind = T::KEY, "Reply has no findings array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(finding) => Some(finding),
            Err(e) => {
                debug!(chunk, kind = T::KEY, error = %e, "Skipping malformed finding");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn clause_prompt(text: &str, language: &str) -> String {
    format!(
        r#"Analyze the following lease text and identify potentially unfair, illegal, or problematic clauses.
Write all text fields in the language with code "{language}".

Lease text:
{text}

For each problematic clause you find, provide:
1. A summary of the clause
2. Why it's problematic
3. The severity (high, medium, low)
4. A clear explanation
5. The recommended action

Format your response as JSON with this structure:
{{
    "clauses": [
        {{
            "clause_text": "summary of the clause",
            "issue": "brief description of the problem",
            "severity": "high/medium/low",
            "explanation": "clear explanation",
            "recommendation": "what the tenant should do"
        }}
    ]
}}"#
    )
}

fn rights_prompt(text: &str, language: &str) -> String {
    format!(
        r#"Analyze this lease text and extract the key tenant rights and obligations.
Write all text fields in the language with code "{language}".

Lease text:
{text}

Identify:
1. Rights the tenant has
2. Obligations the tenant must fulfill
3. Important deadlines or procedures

Format as JSON:
{{
    "rights": [
        {{
            "title": "Right name",
            "description": "What this right means",
            "importance": "high/medium/low"
        }}
    ]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tenantlens_core::Severity;
    use tenantlens_providers::MockProvider;

    fn chunk(text: &str) -> TextChunk {
        TextChunk {
            index: 0,
            text: text.to_string(),
            start: 0,
            core_start: 0,
            end: text.len(),
        }
    }

    fn clause_extractor(provider: MockProvider) -> ClauseExtractor {
        ClauseExtractor::new(Arc::new(provider), LlmPolicy::default())
    }

    #[tokio::test]
    async fn test_strict_json_reply() {
        let provider = MockProvider::new("mock").with_response(
            r#"{"clauses": [{"clause_text": "No pets", "issue": "Blanket ban", "severity": "Medium",
                "explanation": "e", "recommendation": "r"}]}"#,
        );
        let out = clause_extractor(provider).extract(&chunk("lease"), "en").await;
        assert!(!out.degraded);
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_fenced_reply_with_prose() {
        let provider = MockProvider::new("mock").with_response(
            "Sure! Here you go:\n```json\n{\"clauses\": [{\"clause_text\": \"c\", \"issue\": \"i\", \"severity\": \"high\", \"explanation\": \"e\", \"recommendation\": \"r\"}]}\n```",
        );
        let out = clause_extractor(provider).extract(&chunk("lease"), "en").await;
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_unparseable_reply_yields_placeholder() {
        let provider = MockProvider::new("mock").with_response("I'm sorry, I can't help with that.");
        let out = clause_extractor(provider).extract(&chunk("lease"), "en").await;
        assert!(out.degraded);
        assert_eq!(out.findings, vec![ClauseFinding::parse_failure_placeholder()]);
        assert_eq!(out.findings[0].issue, "JSON parsing error");
        assert_eq!(out.findings[0].severity, Severity::Low);
    }

    #[tokio::test]
    async fn test_provider_error_yields_nothing() {
        let provider = MockProvider::new("mock").with_handler(|_| anyhow::bail!("503 upstream"));
        let out = clause_extractor(provider).extract(&chunk("lease"), "en").await;
        assert!(out.degraded);
        assert!(out.findings.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_yields_nothing() {
        let provider = MockProvider::new("mock")
            .with_response(r#"{"clauses": []}"#)
            .with_delay(Duration::from_millis(200));
        let out = clause_extractor(provider)
            .with_timeout(Duration::from_millis(20))
            .extract(&chunk("lease"), "en")
            .await;
        assert!(out.degraded);
        assert!(out.findings.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_entries_skipped_and_unknown_severity_kept() {
        let provider = MockProvider::new("mock").with_response(
            r#"{"clauses": [
                {"clause_text": "missing fields"},
                {"clause_text": "c", "issue": "i", "severity": "critical", "explanation": "e", "recommendation": "r"}
            ]}"#,
        );
        let out = clause_extractor(provider).extract(&chunk("lease"), "en").await;
        assert!(!out.degraded);
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].severity, Severity::Unknown);
    }

    #[tokio::test]
    async fn test_rights_extraction_and_prompt() {
        let provider = Arc::new(MockProvider::new("mock").with_handler(|req| {
            assert!(req.user_prompt.contains("Security deposit returned in 14 days"));
            assert!(req.user_prompt.contains("\"rights\""));
            assert!(req.system_prompt.contains("ONLY respond with valid JSON"));
            Ok(r#"{"rights": [{"title": "Deposit return", "description": "d", "importance": "high"}]}"#.to_string())
        }));
        let extractor = RightsExtractor::new(provider.clone(), LlmPolicy::default());
        let out = extractor
            .extract(&chunk("Security deposit returned in 14 days"), "en")
            .await;
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].importance, Severity::High);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_rights_placeholder() {
        let provider = MockProvider::new("mock").with_response("no json here");
        let extractor = RightsExtractor::new(Arc::new(provider), LlmPolicy::default());
        let out = extractor.extract(&chunk("lease"), "en").await;
        assert_eq!(out.findings, vec![RightFinding::parse_failure_placeholder()]);
    }

    #[tokio::test]
    async fn test_missing_key_is_empty_not_degraded() {
        let provider = MockProvider::new("mock").with_response(r#"{"notes": "nothing unusual"}"#);
        let out = clause_extractor(provider).extract(&chunk("lease"), "en").await;
        assert!(!out.degraded);
        assert!(out.findings.is_empty());
    }
}
