//! CLI Doctor Command
//!
//! Checks that the external OCR tools run and that the configured provider
//! can be constructed.

use std::collections::HashMap;

use anyhow::Result;
use tokio::process::Command;

use tenantlens_config::{validate, TenantLensConfig, KNOWN_PROVIDERS};
use tenantlens_config::validation::REMOTE_PROVIDERS;

use crate::config::{provider_name, provider_settings};
use crate::terminal_output::{note_error, note_success, note_warn};

/// Outcome of one check.
#[derive(Debug, PartialEq, Eq)]
pub enum Check {
    Ok(String),
    Warn(String),
    Fail(String),
}

impl Check {
    fn report(&self) {
        match self {
            Check::Ok(msg) => note_success(msg),
            Check::Warn(msg) => note_warn(msg),
            Check::Fail(msg) => note_error(msg),
        }
    }

    fn failed(&self) -> bool {
        matches!(self, Check::Fail(_))
    }
}

/// Executes the full doctor diagnosis. Returns whether every check passed.
pub async fn run(config: &TenantLensConfig) -> Result<bool> {
    eprintln!("Running TenantLens doctor...\n");

    let ocr = config.ocr.clone().unwrap_or_default();
    let pdftoppm = ocr.pdftoppm_path.as_deref().unwrap_or("pdftoppm");
    let tesseract = ocr.tesseract_path.as_deref().unwrap_or("tesseract");

    let env: HashMap<String, String> = std::env::vars().collect();
    let mut checks = vec![
        check_binary(pdftoppm, "-v").await,
        check_binary(tesseract, "--version").await,
        check_provider(config, &env),
    ];
    checks.extend(check_config(config));

    let mut all_good = true;
    for check in &checks {
        check.report();
        all_good &= !check.failed();
    }

    eprintln!();
    if all_good {
        note_success("All checks passed.");
    } else {
        note_error("Some checks failed. Please fix the errors above.");
    }
    Ok(all_good)
}

async fn check_binary(binary: &str, version_flag: &str) -> Check {
    // pdftoppm prints its version to stderr and some builds exit non-zero, so
    // only a failed spawn counts.
    match Command::new(binary).arg(version_flag).output().await {
        Ok(output) => {
            let banner = String::from_utf8_lossy(if output.stdout.is_empty() {
                &output.stderr
            } else {
                &output.stdout
            })
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
            Check::Ok(format!("{binary} found ({banner})"))
        }
        Err(e) => Check::Fail(format!("{binary} is not runnable: {e}")),
    }
}

fn check_provider(config: &TenantLensConfig, env: &HashMap<String, String>) -> Check {
    let name = provider_name(config);
    if !KNOWN_PROVIDERS.contains(&name) {
        return Check::Fail(format!("unknown provider '{name}'"));
    }
    if REMOTE_PROVIDERS.contains(&name) && provider_settings(config, env).api_key.is_none() {
        return Check::Fail(format!("provider '{name}' has no API key"));
    }
    Check::Ok(format!("provider '{name}' is configured"))
}

fn check_config(config: &TenantLensConfig) -> Vec<Check> {
    let report = validate(config);
    if report.is_valid() {
        return vec![Check::Ok("config is valid".to_string())];
    }
    report
        .errors
        .iter()
        .map(|e| Check::Fail(format!("{}: {}", e.path, e.message)))
        .collect()
}
