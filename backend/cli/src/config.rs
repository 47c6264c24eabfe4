//! Wiring from the loaded [`TenantLensConfig`] to pipeline components.
//!
//! Expects a config that went through `apply_all_defaults`; missing fields
//! fall back to the component defaults anyway.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use tenantlens_analysis::{AnalyzerOptions, LeaseAnalyzer};
use tenantlens_config::TenantLensConfig;
use tenantlens_core::{LlmPolicy, LlmProvider};
use tenantlens_providers::{build_provider, ProviderSettings};
use tenantlens_understanding::{PdftoppmRasterizer, TesseractCli, TextRecoveryEngine};

/// Environment variables consulted when the config carries no API key.
const API_KEY_ENV_VARS: &[(&str, &str)] = &[
    ("openrouter", "OPENROUTER_API_KEY"),
    ("gemini", "GEMINI_API_KEY"),
];

pub fn provider_name(config: &TenantLensConfig) -> &str {
    config
        .provider
        .as_ref()
        .and_then(|p| p.name.as_deref())
        .unwrap_or(tenantlens_config::defaults::DEFAULT_PROVIDER)
}

pub fn analysis_language(config: &TenantLensConfig) -> String {
    config
        .analysis
        .as_ref()
        .and_then(|a| a.language.clone())
        .unwrap_or_else(|| tenantlens_config::defaults::DEFAULT_ANALYSIS_LANGUAGE.to_string())
}

pub fn analyzer_options(config: &TenantLensConfig) -> AnalyzerOptions {
    let mut options = AnalyzerOptions::default();

    if let Some(analysis) = &config.analysis {
        if let Some(v) = analysis.chunk_size {
            options.chunk_size = v;
        }
        if let Some(v) = analysis.chunk_overlap {
            options.chunk_overlap = v;
        }
        if let Some(v) = analysis.max_clauses {
            options.max_clauses = v;
        }
        if let Some(v) = analysis.max_concurrent_chunks {
            options.max_concurrent_chunks = v;
        }
        if let Some(v) = analysis.call_timeout_secs {
            options.call_timeout = Duration::from_secs(v);
        }
        if let Some(v) = analysis.summary_input_chars {
            options.summary_input_chars = v;
        }
    }

    if let Some(provider) = &config.provider {
        let defaults = LlmPolicy::default();
        options.policy = LlmPolicy {
            model: provider.model.clone().unwrap_or(defaults.model),
            max_tokens: provider.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: provider.temperature.unwrap_or(defaults.temperature),
        };
    }

    options
}

pub fn recovery_engine(config: &TenantLensConfig) -> TextRecoveryEngine {
    let mut rasterizer = PdftoppmRasterizer::new();
    let mut recognizer = TesseractCli::new();
    let mut max_pages = None;

    if let Some(ocr) = &config.ocr {
        if let Some(dpi) = ocr.dpi {
            rasterizer = rasterizer.with_dpi(dpi);
        }
        if let Some(path) = &ocr.pdftoppm_path {
            rasterizer = rasterizer.with_binary(PathBuf::from(path));
        }
        if let Some(language) = &ocr.language {
            recognizer = recognizer.with_language(language.clone());
        }
        if let Some(psm) = ocr.page_seg_mode {
            recognizer = recognizer.with_page_seg_mode(psm);
        }
        if let Some(path) = &ocr.tesseract_path {
            recognizer = recognizer.with_binary(PathBuf::from(path));
        }
        if let Some(secs) = ocr.page_timeout_secs {
            recognizer = recognizer.with_timeout(Duration::from_secs(secs));
        }
        max_pages = ocr.max_concurrent_pages;
    }

    let engine = TextRecoveryEngine::new(Arc::new(rasterizer), Arc::new(recognizer));
    match max_pages {
        Some(n) => engine.with_max_concurrent_pages(n),
        None => engine,
    }
}

/// Provider settings, taking the API key from `env` when the config has none.
pub fn provider_settings(
    config: &TenantLensConfig,
    env: &HashMap<String, String>,
) -> ProviderSettings {
    let name = provider_name(config);
    let provider = config.provider.as_ref();

    let api_key = provider
        .and_then(|p| p.api_key.clone())
        .filter(|k| !k.is_empty())
        .or_else(|| {
            API_KEY_ENV_VARS
                .iter()
                .find(|(provider, _)| *provider == name)
                .and_then(|(_, var)| env.get(*var).cloned())
                .filter(|k| !k.is_empty())
        });

    ProviderSettings {
        api_key,
        base_url: provider.and_then(|p| p.base_url.clone()),
        timeout: config
            .analysis
            .as_ref()
            .and_then(|a| a.call_timeout_secs)
            .map(Duration::from_secs),
    }
}

pub fn provider(config: &TenantLensConfig) -> Result<Arc<dyn LlmProvider>> {
    let env: HashMap<String, String> = std::env::vars().collect();
    build_provider(provider_name(config), &provider_settings(config, &env))
}

/// A fully wired analyzer.
pub fn analyzer(config: &TenantLensConfig) -> Result<LeaseAnalyzer> {
    let analyzer = LeaseAnalyzer::new(provider(config)?, analyzer_options(config))
        .with_recovery(Arc::new(recovery_engine(config)));
    Ok(analyzer)
}
