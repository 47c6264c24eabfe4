use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LeaseError;

/// Declared media type of an uploaded lease document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
    Tiff,
}

impl MediaType {
    /// Canonical MIME string.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Tiff => "image/tiff",
        }
    }
}

impl FromStr for MediaType {
    type Err = LeaseError;

    /// Parses a declared MIME string. Parameters (`; charset=...`) are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Ok(MediaType::Pdf),
            "image/jpeg" | "image/jpg" => Ok(MediaType::Jpeg),
            "image/png" => Ok(MediaType::Png),
            "image/tiff" | "image/tif" => Ok(MediaType::Tiff),
            _ => Err(LeaseError::UnsupportedMediaType(s.to_string())),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// An uploaded document, consumed once by text recovery.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub media_type: MediaType,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Bytes>, media_type: MediaType) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
        }
    }

    /// Build from a declared MIME string, rejecting anything outside the accepted set.
    pub fn from_declared(bytes: impl Into<Bytes>, declared: &str) -> Result<Self, LeaseError> {
        let media_type = declared.parse()?;
        Ok(Self::new(bytes, media_type))
    }
}

/// Text recovered from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Zero-based page index.
    pub index: usize,
    pub text: String,
}

/// Ordered per-page text recovered from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredText {
    pub pages: Vec<PageText>,
    /// Indices of pages whose recognition failed; their text is empty.
    #[serde(default)]
    pub failed_pages: Vec<usize>,
    /// Whether `render` prefixes each page with a `--- Page N ---` marker.
    #[serde(default)]
    pub page_markers: bool,
}

impl RecoveredText {
    /// Concatenate pages in index order into the final text.
    pub fn render(&self) -> String {
        let mut pages: Vec<&PageText> = self.pages.iter().collect();
        pages.sort_by_key(|p| p.index);

        let rendered = if self.page_markers {
            pages
                .iter()
                .map(|p| format!("--- Page {} ---\n{}", p.index + 1, p.text.trim()))
                .collect::<Vec<_>>()
                .join("\n\n")
        } else {
            pages
                .iter()
                .map(|p| p.text.trim())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        rendered.trim().to_string()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_degraded(&self) -> bool {
        !self.failed_pages.is_empty()
    }
}

/// A bounded-size segment of recovered text.
///
/// Offsets are byte offsets into the source. `start..core_start` is the region
/// shared with the previous chunk; `core_start..end` is new text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    pub start: usize,
    pub core_start: usize,
    pub end: usize,
}

impl TextChunk {
    /// The part of this chunk not already covered by its predecessor.
    pub fn core(&self) -> &str {
        &self.text[self.core_start - self.start..]
    }
}

/// Ordinal weight shared by clause severity and right importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

/// Importance of a tenant right uses the same closed scale as severity.
pub type Importance = Severity;

impl Severity {
    /// Sort rank: high=3, medium=2, low=1, unknown=0.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }

    /// Lenient parse; anything unrecognized is `Unknown`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Severity::High,
            "medium" | "med" | "moderate" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Severity::parse_lenient(&raw))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A potentially unfair or problematic lease clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseFinding {
    pub clause_text: String,
    pub issue: String,
    pub severity: Severity,
    pub explanation: String,
    pub recommendation: String,
}

impl ClauseFinding {
    /// Placeholder emitted when a chunk's structured output cannot be parsed.
    pub fn parse_failure_placeholder() -> Self {
        Self {
            clause_text: "Analysis unavailable".to_string(),
            issue: "JSON parsing error".to_string(),
            severity: Severity::Low,
            explanation: "The AI response could not be parsed properly".to_string(),
            recommendation: "Try uploading the document again".to_string(),
        }
    }
}

/// A tenant right or obligation found in the lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RightFinding {
    pub title: String,
    pub description: String,
    pub importance: Importance,
}

impl RightFinding {
    pub fn parse_failure_placeholder() -> Self {
        Self {
            title: "Analysis unavailable".to_string(),
            description: "The AI response could not be parsed properly".to_string(),
            importance: Severity::Low,
        }
    }
}

/// Final fairness analysis of one lease document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// Severity-sorted, length-capped.
    pub unfair_clauses: Vec<ClauseFinding>,
    pub plain_english_summary: String,
    pub tenant_rights: Vec<RightFinding>,
    pub recommendations: Vec<String>,
    /// 0..=100, higher is fairer.
    pub overall_score: f64,
    /// Chunks whose extraction failed, timed out, or yielded a placeholder.
    #[serde(default)]
    pub degraded_chunks: usize,
}

impl DocumentAnalysis {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.overall_score)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded_chunks > 0
    }
}

/// Coarse risk bucket derived from the fairness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 50.0 {
            RiskLevel::High
        } else if score < 75.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::Low => write!(f, "low"),
        }
    }
}

/// Model selection and sampling settings for one kind of generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmPolicy {
    /// Model to request from the provider
    pub model: String,
    /// Maximum tokens for completion
    pub max_tokens: u32,
    /// Temperature for generation
    pub temperature: f32,
}

impl Default for LlmPolicy {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            max_tokens: 2048,
            temperature: 0.1,
        }
    }
}
