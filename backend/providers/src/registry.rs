use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use tenantlens_core::LlmProvider;

use crate::gemini::GeminiProvider;
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openrouter::OpenRouterProvider;

/// Connection settings for constructing a provider by name.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

/// Known provider names accepted by [`build_provider`].
pub const PROVIDER_NAMES: &[&str] = &["openrouter", "ollama", "gemini", "mock"];

/// Construct a provider from its name and settings.
pub fn build_provider(name: &str, settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match name {
        "openrouter" => {
            let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) else {
                bail!("provider 'openrouter' requires an API key");
            };
            let mut p = OpenRouterProvider::new(key);
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            if let Some(timeout) = settings.timeout {
                p = p.with_timeout(timeout);
            }
            Arc::new(p)
        }
        "gemini" => {
            let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) else {
                bail!("provider 'gemini' requires an API key");
            };
            let mut p = GeminiProvider::new(key);
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            if let Some(timeout) = settings.timeout {
                p = p.with_timeout(timeout);
            }
            Arc::new(p)
        }
        "ollama" => {
            let mut p = OllamaProvider::new();
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            if let Some(timeout) = settings.timeout {
                p = p.with_timeout(timeout);
            }
            Arc::new(p)
        }
        "mock" => Arc::new(MockProvider::new("mock").with_response(r#"{"clauses": [], "rights": []}"#)),
        other => bail!(
            "unknown provider '{}'; expected one of: {}",
            other,
            PROVIDER_NAMES.join(", ")
        ),
    };

    info!(provider = %name, "Constructed LLM provider");
    Ok(provider)
}
