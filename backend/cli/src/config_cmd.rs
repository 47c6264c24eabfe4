//! `config` command: show or initialize the effective configuration.

use std::path::Path;

use anyhow::{Context, Result};

use tenantlens_config::{collect_redacted_paths, redact, validate, write_config, TenantLensConfig};

use crate::terminal_output::{note_info, note_success, note_warn};

/// The config as printable JSON, secrets masked.
pub fn effective_config_json(config: &TenantLensConfig) -> Result<serde_json::Value> {
    let value = serde_json::to_value(config).context("failed to serialize config")?;
    Ok(redact(&value))
}

pub async fn run(config: &TenantLensConfig, path: &Path, init: bool) -> Result<()> {
    if init {
        write_config(config, path).await?;
        note_success(&format!("Wrote {}", path.display()));
        return Ok(());
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&effective_config_json(config)?)?
    );
    let masked = collect_redacted_paths(&serde_json::to_value(config)?);

    note_info(&format!("Config file: {}", path.display()));
    if !masked.is_empty() {
        note_info(&format!("Masked: {}", masked.join(", ")));
    }
    for warning in validate(config).warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantlens_config::{apply_all_defaults, load_config, ProviderConfig};

    #[test]
    fn api_key_is_masked() {
        let cfg = apply_all_defaults(TenantLensConfig {
            provider: Some(ProviderConfig {
                api_key: Some("sk-or-v1-abcdef0123456789".into()),
                ..Default::default()
            }),
            ..Default::default()
        });

        let json = effective_config_json(&cfg).unwrap();
        assert_eq!(json["provider"]["apiKey"], "sk-o***");
        assert_eq!(json["ocr"]["dpi"], 300);
    }

    #[tokio::test]
    async fn init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let cfg = apply_all_defaults(TenantLensConfig::default());

        run(&cfg, &path, true).await.unwrap();

        assert_eq!(load_config(&path).await.unwrap(), cfg);
    }
}
