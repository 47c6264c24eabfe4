//! `tenantlens-config` — TenantLens runtime configuration management.
//!
//! Provides:
//! - Typed config schema (OCR, analysis, provider, logging)
//! - YAML read/write with backup rotation
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe display
//! - Default value application
//! - Range and consistency validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{AnalysisConfig, LoggingConfig, OcrConfig, ProviderConfig, TenantLensConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport, KNOWN_PROVIDERS};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load a config file, apply env substitution and fill defaults.
///
/// This is the main entry point for loading a config at runtime. The result
/// is not validated; run [`validate`] and [`log_report`] once logging is up.
pub async fn load_and_prepare(path: &Path) -> Result<TenantLensConfig> {
    let raw_config = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;

    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config: TenantLensConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    Ok(apply_all_defaults(config))
}

/// Log every warning and error of a validation report.
pub fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepares_file_with_partial_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "provider:\n  name: ollama\nanalysis:\n  chunkSize: 1000\n").unwrap();

        let cfg = load_and_prepare(&path).await.unwrap();

        let provider = cfg.provider.unwrap();
        assert_eq!(provider.name.as_deref(), Some("ollama"));
        assert_eq!(provider.model.as_deref(), Some("llama3.1"));
        let analysis = cfg.analysis.unwrap();
        assert_eq!(analysis.chunk_size, Some(1000));
        assert_eq!(analysis.chunk_overlap, Some(200));
    }
}
