//! Config validation: range and consistency checks with field paths.

use crate::schema::TenantLensConfig;
use thiserror::Error;

/// Provider names the runtime knows how to construct.
pub const KNOWN_PROVIDERS: &[&str] = &["openrouter", "ollama", "gemini", "mock"];

/// Providers that need an API key.
pub const REMOTE_PROVIDERS: &[&str] = &["openrouter", "gemini"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &TenantLensConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_ocr(config, &mut report);
    validate_analysis(config, &mut report);
    validate_provider(config, &mut report);
    report
}

fn validate_ocr(config: &TenantLensConfig, report: &mut ValidationReport) {
    let Some(ocr) = &config.ocr else { return };

    if let Some(dpi) = ocr.dpi {
        if !(72..=600).contains(&dpi) {
            report.error("ocr.dpi", format!("dpi {dpi} is outside 72..=600"));
        } else if dpi < 150 {
            report.warn(
                "ocr.dpi",
                format!("dpi {dpi} is low for OCR; scanned leases read best at 300"),
            );
        }
    }
    if ocr.page_seg_mode.is_some_and(|psm| psm > 13) {
        report.error("ocr.pageSegMode", "Tesseract page segmentation modes are 0..=13");
    }
    if ocr.max_concurrent_pages == Some(0) {
        report.error("ocr.maxConcurrentPages", "maxConcurrentPages must be >= 1");
    }
    if ocr.page_timeout_secs == Some(0) {
        report.error("ocr.pageTimeoutSecs", "pageTimeoutSecs must be >= 1");
    }
}

fn validate_analysis(config: &TenantLensConfig, report: &mut ValidationReport) {
    let Some(analysis) = &config.analysis else { return };

    if analysis.chunk_size == Some(0) {
        report.error("analysis.chunkSize", "chunkSize must be >= 1");
    }
    if let (Some(size), Some(overlap)) = (analysis.chunk_size, analysis.chunk_overlap) {
        if overlap >= size {
            report.error(
                "analysis.chunkOverlap",
                format!("chunkOverlap ({overlap}) must be smaller than chunkSize ({size})"),
            );
        }
    }
    if analysis.max_concurrent_chunks == Some(0) {
        report.error("analysis.maxConcurrentChunks", "maxConcurrentChunks must be >= 1");
    }
    if analysis.max_clauses == Some(0) {
        report.warn("analysis.maxClauses", "maxClauses is 0; no clauses will be reported");
    }
    if analysis.call_timeout_secs == Some(0) {
        report.error("analysis.callTimeoutSecs", "callTimeoutSecs must be >= 1");
    }
}

fn validate_provider(config: &TenantLensConfig, report: &mut ValidationReport) {
    let Some(provider) = &config.provider else { return };

    if let Some(name) = &provider.name {
        if !KNOWN_PROVIDERS.contains(&name.as_str()) {
            report.error(
                "provider.name",
                format!(
                    "Unknown provider '{name}'. Use one of: {}",
                    KNOWN_PROVIDERS.join(", ")
                ),
            );
        } else if REMOTE_PROVIDERS.contains(&name.as_str())
            && provider.api_key.as_deref().map(str::is_empty).unwrap_or(true)
        {
            report.warn(
                "provider.apiKey",
                format!("No API key configured for '{name}'; model calls will fail unless one is supplied via the environment"),
            );
        }
    }
    if provider
        .temperature
        .is_some_and(|t| !(0.0..=2.0).contains(&t))
    {
        report.error("provider.temperature", "temperature must be within 0.0..=2.0");
    }
    if provider.max_tokens == Some(0) {
        report.error("provider.maxTokens", "maxTokens must be >= 1");
    }
}
