//! Config defaults: fills every unset field after loading.

use crate::schema::{AnalysisConfig, LoggingConfig, OcrConfig, ProviderConfig, TenantLensConfig};

pub const DEFAULT_DPI: u32 = 300;
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
/// Single uniform block of text.
pub const DEFAULT_PAGE_SEG_MODE: u8 = 6;
pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 4;
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_MAX_CLAUSES: usize = 20;
pub const DEFAULT_MAX_CONCURRENT_CHUNKS: usize = 4;
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SUMMARY_INPUT_CHARS: usize = 4000;
pub const DEFAULT_ANALYSIS_LANGUAGE: &str = "en";

pub const DEFAULT_PROVIDER: &str = "openrouter";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Model used when none is configured for the given provider.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "gemini" => "gemini-1.5-flash",
        "ollama" => "llama3.1",
        "mock" => "mock",
        _ => "openai/gpt-4o-mini",
    }
}

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: TenantLensConfig) -> TenantLensConfig {
    let config = apply_ocr_defaults(config);
    let config = apply_analysis_defaults(config);
    let config = apply_provider_defaults(config);
    apply_logging_defaults(config)
}

fn apply_ocr_defaults(mut config: TenantLensConfig) -> TenantLensConfig {
    let ocr = config.ocr.get_or_insert_with(OcrConfig::default);
    ocr.dpi.get_or_insert(DEFAULT_DPI);
    ocr.language
        .get_or_insert_with(|| DEFAULT_OCR_LANGUAGE.to_string());
    ocr.page_seg_mode.get_or_insert(DEFAULT_PAGE_SEG_MODE);
    ocr.max_concurrent_pages
        .get_or_insert(DEFAULT_MAX_CONCURRENT_PAGES);
    ocr.page_timeout_secs.get_or_insert(DEFAULT_PAGE_TIMEOUT_SECS);
    config
}

fn apply_analysis_defaults(mut config: TenantLensConfig) -> TenantLensConfig {
    let analysis = config.analysis.get_or_insert_with(AnalysisConfig::default);
    analysis.chunk_size.get_or_insert(DEFAULT_CHUNK_SIZE);
    analysis.chunk_overlap.get_or_insert(DEFAULT_CHUNK_OVERLAP);
    analysis.max_clauses.get_or_insert(DEFAULT_MAX_CLAUSES);
    analysis
        .max_concurrent_chunks
        .get_or_insert(DEFAULT_MAX_CONCURRENT_CHUNKS);
    analysis
        .call_timeout_secs
        .get_or_insert(DEFAULT_CALL_TIMEOUT_SECS);
    analysis
        .summary_input_chars
        .get_or_insert(DEFAULT_SUMMARY_INPUT_CHARS);
    analysis
        .language
        .get_or_insert_with(|| DEFAULT_ANALYSIS_LANGUAGE.to_string());
    config
}

/// Provider name first; the default model depends on it.
fn apply_provider_defaults(mut config: TenantLensConfig) -> TenantLensConfig {
    let provider = config.provider.get_or_insert_with(ProviderConfig::default);
    let name = provider
        .name
        .get_or_insert_with(|| DEFAULT_PROVIDER.to_string())
        .clone();
    provider
        .model
        .get_or_insert_with(|| default_model(&name).to_string());
    provider.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    provider.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    config
}

fn apply_logging_defaults(mut config: TenantLensConfig) -> TenantLensConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(TenantLensConfig::default());
        let ocr = cfg.ocr.unwrap();
        assert_eq!(ocr.dpi, Some(300));
        assert_eq!(ocr.language.as_deref(), Some("eng"));
        assert_eq!(ocr.page_seg_mode, Some(6));
        let analysis = cfg.analysis.unwrap();
        assert_eq!(analysis.chunk_size, Some(2000));
        assert_eq!(analysis.chunk_overlap, Some(200));
        assert_eq!(analysis.max_clauses, Some(20));
        let provider = cfg.provider.unwrap();
        assert_eq!(provider.name.as_deref(), Some("openrouter"));
        assert_eq!(provider.model.as_deref(), Some("openai/gpt-4o-mini"));
        assert!(provider.api_key.is_none());
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn model_default_follows_provider() {
        let cfg = TenantLensConfig {
            provider: Some(ProviderConfig {
                name: Some("gemini".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.provider.unwrap().model.as_deref(), Some("gemini-1.5-flash"));
    }

    #[test]
    fn does_not_override_user_values() {
        let cfg = TenantLensConfig {
            analysis: Some(AnalysisConfig {
                chunk_size: Some(1500),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        let analysis = cfg.analysis.unwrap();
        assert_eq!(analysis.chunk_size, Some(1500));
        assert_eq!(analysis.chunk_overlap, Some(200));
    }
}
