//! TenantLens runtime configuration schema.
//!
//! Every field is optional on disk; `defaults::apply_all_defaults` fills the
//! gaps after loading.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantLensConfig {
    /// Text recovery (rasterization and OCR)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrConfig>,

    /// Chunking, extraction and summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisConfig>,

    /// Text-generation provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// Rasterization resolution for PDFs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,

    /// Tesseract language code(s), e.g. "eng" or "eng+spa"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Tesseract page segmentation mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_seg_mode: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftoppm_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_pages: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Chunk length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,

    /// Characters shared between consecutive chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_clauses: Option<usize>,

    /// Chunks analyzed at once; each chunk issues two model calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_chunks: Option<usize>,

    /// Per model call timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_input_chars: Option<usize>,

    /// Response language code passed to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// "openrouter" | "ollama" | "gemini" | "mock"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Level filter, e.g. "info" or "tenantlens_analysis=debug"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for daily-rolling NDJSON logs; unset disables file output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// JSON console output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
ocr:
  dpi: 200
  pageSegMode: 4
analysis:
  chunkOverlap: 100
  maxConcurrentChunks: 8
provider:
  name: gemini
  apiKey: abc
"#;
        let cfg: TenantLensConfig = serde_yaml::from_str(yaml).unwrap();
        let ocr = cfg.ocr.unwrap();
        assert_eq!(ocr.dpi, Some(200));
        assert_eq!(ocr.page_seg_mode, Some(4));
        assert_eq!(cfg.analysis.unwrap().max_concurrent_chunks, Some(8));
        assert_eq!(cfg.provider.unwrap().api_key.as_deref(), Some("abc"));
        assert!(cfg.logging.is_none());
    }

    #[test]
    fn empty_sections_are_omitted_when_serialized() {
        let json = serde_json::to_value(TenantLensConfig::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
