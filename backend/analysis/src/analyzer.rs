//! Lease analysis pipeline.
//!
//! Chunks recovered text, fans the chunks out to the clause and rights
//! extractors under a concurrency limit, then ranks, scores and summarizes.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use tenantlens_core::{
    ClauseFinding, DocumentAnalysis, LeaseError, LlmPolicy, LlmProvider, RawDocument,
    RecoveredText, RightFinding, TextChunk,
};
use tenantlens_logging::{AnalysisEvent, AnalysisEventLogger};
use tenantlens_understanding::{looks_like_lease, TextRecoveryEngine};

use crate::aggregate::{merge_rights, rank_clauses, MAX_CLAUSES};
use crate::chunker::{chunk_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::extract::{ClauseExtractor, RightsExtractor, DEFAULT_CALL_TIMEOUT};
use crate::recommend::recommendations;
use crate::score::overall_score;
use crate::summary::{Summarizer, DEFAULT_SUMMARY_INPUT_CHARS};

/// Tunables for one analyzer instance.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_clauses: usize,
    /// Chunks in flight at once. Each chunk makes its clause and rights calls
    /// together and the summary call runs alongside, so up to
    /// `2 * max_concurrent_chunks + 1` provider calls can be outstanding.
    pub max_concurrent_chunks: usize,
    pub call_timeout: Duration,
    pub summary_input_chars: usize,
    pub policy: LlmPolicy,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            max_clauses: MAX_CLAUSES,
            max_concurrent_chunks: 4,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            summary_input_chars: DEFAULT_SUMMARY_INPUT_CHARS,
            policy: LlmPolicy::default(),
        }
    }
}

/// A document taken from bytes to analysis.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    pub recovered: RecoveredText,
    /// Rendered text that was analyzed.
    pub text: String,
    /// Advisory verdict of the lease validator.
    pub looks_like_lease: bool,
    pub analysis: DocumentAnalysis,
}

/// What one chunk contributed.
struct ChunkResult {
    clauses: Vec<ClauseFinding>,
    rights: Vec<RightFinding>,
    degraded: bool,
}

pub struct LeaseAnalyzer {
    clause_extractor: ClauseExtractor,
    rights_extractor: RightsExtractor,
    summarizer: Summarizer,
    recovery: Arc<TextRecoveryEngine>,
    options: AnalyzerOptions,
}

impl LeaseAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, options: AnalyzerOptions) -> Self {
        let clause_extractor = ClauseExtractor::new(Arc::clone(&provider), options.policy.clone())
            .with_timeout(options.call_timeout);
        let rights_extractor = RightsExtractor::new(Arc::clone(&provider), options.policy.clone())
            .with_timeout(options.call_timeout);
        let summarizer = Summarizer::new(provider, options.policy.clone())
            .with_input_chars(options.summary_input_chars)
            .with_timeout(options.call_timeout);

        Self {
            clause_extractor,
            rights_extractor,
            summarizer,
            recovery: Arc::new(TextRecoveryEngine::default()),
            options,
        }
    }

    /// Replace the default (pdftoppm + tesseract) recovery engine.
    pub fn with_recovery(mut self, recovery: Arc<TextRecoveryEngine>) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyze already-recovered lease text.
    ///
    /// Never fails: chunks whose extraction failed contribute nothing (or a
    /// placeholder) and are counted in `degraded_chunks`.
    pub async fn analyze(&self, text: &str, language: &str) -> DocumentAnalysis {
        let chunks = chunk_text(text, self.options.chunk_size, self.options.chunk_overlap);
        info!(
            chars = text.chars().count(),
            chunks = chunks.len(),
            language,
            "Analyzing lease text"
        );

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_chunks.max(1)));
        let chunk_tasks = chunks
            .iter()
            .map(|chunk| self.analyze_chunk(Arc::clone(&semaphore), chunk, language));

        // join_all keeps chunk order; the summary runs alongside the chunks.
        let (results, summary) = tokio::join!(
            join_all(chunk_tasks),
            self.summarizer.summarize(text, language)
        );

        let mut clauses = Vec::with_capacity(results.len());
        let mut rights = Vec::with_capacity(results.len());
        let mut degraded_chunks = 0;
        for result in results {
            if result.degraded {
                degraded_chunks += 1;
            }
            clauses.push(result.clauses);
            rights.push(result.rights);
        }

        let unfair_clauses = rank_clauses(clauses, self.options.max_clauses);
        let tenant_rights = merge_rights(rights);
        let overall_score = overall_score(&unfair_clauses);

        AnalysisEventLogger::log_event(AnalysisEvent::AnalysisCompleted {
            chunks: chunks.len(),
            clauses: unfair_clauses.len(),
            rights: tenant_rights.len(),
            score: overall_score,
            degraded_chunks,
        });

        DocumentAnalysis {
            recommendations: recommendations(&unfair_clauses),
            unfair_clauses,
            plain_english_summary: summary,
            tenant_rights,
            overall_score,
            degraded_chunks,
        }
    }

    /// Recover text from a document, then analyze it.
    pub async fn analyze_document(
        &self,
        document: &RawDocument,
        language: &str,
    ) -> Result<AnalyzedDocument, LeaseError> {
        let recovered = self.recovery.recover(document).await?;
        let text = recovered.render();

        let looks_like_lease = looks_like_lease(&text);
        if !looks_like_lease {
            warn!(
                chars = text.chars().count(),
                "Recovered text does not look like a lease; analyzing anyway"
            );
        }

        let analysis = self.analyze(&text, language).await;
        Ok(AnalyzedDocument {
            recovered,
            text,
            looks_like_lease,
            analysis,
        })
    }

    async fn analyze_chunk(
        &self,
        semaphore: Arc<Semaphore>,
        chunk: &TextChunk,
        language: &str,
    ) -> ChunkResult {
        // The semaphore is never closed, so a permit is always granted.
        let _permit = semaphore.acquire_owned().await.ok();

        let (clauses, rights) = tokio::join!(
            self.clause_extractor.extract(chunk, language),
            self.rights_extractor.extract(chunk, language)
        );

        let degraded = clauses.degraded || rights.degraded;
        if degraded {
            AnalysisEventLogger::log_event(AnalysisEvent::ChunkDegraded {
                chunk: chunk.index,
                reason: format!(
                    "clauses degraded: {}, rights degraded: {}",
                    clauses.degraded, rights.degraded
                ),
            });
        } else {
            AnalysisEventLogger::log_event(AnalysisEvent::ChunkExtracted {
                chunk: chunk.index,
                clauses: clauses.findings.len(),
                rights: rights.findings.len(),
            });
        }

        ChunkResult {
            clauses: clauses.findings,
            rights: rights.findings,
            degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tenantlens_core::{LlmRequest, LlmResponse, Severity};
    use tenantlens_providers::MockProvider;

    fn small_chunks() -> AnalyzerOptions {
        AnalyzerOptions {
            chunk_size: 100,
            chunk_overlap: 10,
            call_timeout: Duration::from_millis(200),
            ..AnalyzerOptions::default()
        }
    }

    fn clause_json(text: &str, severity: &str) -> String {
        format!(
            r#"{{"clause_text": "{text}", "issue": "i", "severity": "{severity}", "explanation": "e", "recommendation": "r"}}"#
        )
    }

    /// Routes by request kind: clause prompts mention "clauses", rights prompts "rights".
    fn scripted(clauses_reply: impl Fn(&str) -> String + Send + Sync + 'static) -> MockProvider {
        MockProvider::new("mock").with_handler(move |req| {
            if req.user_prompt.contains("\"clauses\"") {
                Ok(clauses_reply(&req.user_prompt))
            } else if req.user_prompt.contains("\"rights\"") {
                Ok(r#"{"rights": [{"title": "Quiet enjoyment", "description": "d", "importance": "medium"}]}"#.to_string())
            } else {
                Ok("Plain summary.".to_string())
            }
        })
    }

    #[tokio::test]
    async fn test_no_findings_scores_85_with_standard_advice() {
        let provider = scripted(|_| r#"{"clauses": []}"#.to_string());
        let analyzer = LeaseAnalyzer::new(Arc::new(provider), AnalyzerOptions::default());

        let analysis = analyzer.analyze("The tenant pays rent monthly.", "en").await;

        assert_eq!(analysis.overall_score, 85.0);
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(analysis.plain_english_summary, "Plain summary.");
        assert_eq!(analysis.tenant_rights.len(), 1);
        assert_eq!(analysis.degraded_chunks, 0);
    }

    #[tokio::test]
    async fn test_findings_ranked_across_chunks() {
        let provider = scripted(|prompt| {
            if prompt.contains("FIRST") {
                format!(r#"{{"clauses": [{}]}}"#, clause_json("late fee", "low"))
            } else {
                format!(r#"{{"clauses": [{}]}}"#, clause_json("entry without notice", "high"))
            }
        });
        let analyzer = LeaseAnalyzer::new(Arc::new(provider), small_chunks());
        let text = format!("FIRST {}\n\n{}", "a ".repeat(40), "b ".repeat(60));

        let analysis = analyzer.analyze(&text, "en").await;

        assert!(analysis.unfair_clauses.len() >= 2);
        assert_eq!(analysis.unfair_clauses[0].severity, Severity::High);
        assert_eq!(analysis.unfair_clauses.last().unwrap().severity, Severity::Low);
        assert!(analysis.recommendations[0].starts_with("🚨 URGENT"));
    }

    #[tokio::test]
    async fn test_failed_chunk_is_counted_not_fatal() {
        let provider = MockProvider::new("mock").with_handler(|req| {
            if req.user_prompt.contains("POISON") && req.user_prompt.contains("\"clauses\"") {
                anyhow::bail!("model overloaded")
            }
            if req.user_prompt.contains("\"rights\"") {
                return Ok(r#"{"rights": []}"#.to_string());
            }
            Ok(r#"{"clauses": []}"#.to_string())
        });
        let analyzer = LeaseAnalyzer::new(Arc::new(provider), small_chunks());
        let text = format!("{}\n\nPOISON {}", "a ".repeat(45), "b ".repeat(10));

        let analysis = analyzer.analyze(&text, "en").await;

        assert_eq!(analysis.degraded_chunks, 1);
        assert!(analysis.is_degraded());
        assert_eq!(analysis.overall_score, 85.0);
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_extraction_calls() {
        let provider = Arc::new(scripted(|_| r#"{"clauses": []}"#.to_string()));
        let analyzer = LeaseAnalyzer::new(provider.clone(), AnalyzerOptions::default());

        let analysis = analyzer.analyze("", "en").await;

        assert!(analysis.unfair_clauses.is_empty());
        assert_eq!(analysis.overall_score, 85.0);
        // Only the summary call.
        assert_eq!(provider.calls(), 1);
    }

    /// Counts calls in flight across an await point: clause calls only, or
    /// every call when `all_calls` is set.
    struct GaugedProvider {
        all_calls: bool,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl GaugedProvider {
        fn new(all_calls: bool) -> Self {
            Self {
                all_calls,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for GaugedProvider {
        fn name(&self) -> &str {
            "gauged"
        }

        async fn complete(&self, req: &LlmRequest) -> anyhow::Result<LlmResponse> {
            if self.all_calls || req.user_prompt.contains("\"clauses\"") {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            Ok(LlmResponse {
                content: "{}".to_string(),
                provider: "gauged".to_string(),
                model: req.model.clone(),
                tokens_used: 0,
                latency_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_chunk_concurrency_is_bounded() {
        let provider = Arc::new(GaugedProvider::new(false));
        let options = AnalyzerOptions {
            max_concurrent_chunks: 2,
            ..small_chunks()
        };
        let analyzer = LeaseAnalyzer::new(provider.clone(), options);

        let analysis = analyzer.analyze(&"word ".repeat(400), "en").await;

        assert_eq!(analysis.degraded_chunks, 0);
        assert!(provider.peak.load(Ordering::SeqCst) >= 1);
        assert!(provider.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_provider_calls_bounded_by_twice_chunks_plus_summary() {
        let provider = Arc::new(GaugedProvider::new(true));
        let options = AnalyzerOptions {
            max_concurrent_chunks: 2,
            ..small_chunks()
        };
        let analyzer = LeaseAnalyzer::new(provider.clone(), options);

        let analysis = analyzer.analyze(&"word ".repeat(400), "en").await;

        assert_eq!(analysis.degraded_chunks, 0);
        assert!(provider.peak.load(Ordering::SeqCst) <= 2 * 2 + 1);
    }
}
