//! `recover` and `validate` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use tenantlens_config::TenantLensConfig;
use tenantlens_core::{LeaseError, RawDocument, RecoveredText};
use tenantlens_understanding::{detect, keyword_hits, looks_like_lease};

use crate::config::recovery_engine;
use crate::terminal_output::{note_info, note_warn};

#[derive(Debug, Args)]
pub struct RecoverArgs {
    /// PDF or image file to recover text from
    pub file: PathBuf,

    /// MIME type, e.g. application/pdf (detected from content/extension otherwise)
    #[arg(long)]
    pub media_type: Option<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Plain-text file to check
    pub file: PathBuf,
}

/// Validator verdict, printed by `recover` and `validate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub looks_like_lease: bool,
    pub chars: usize,
    pub keywords: Vec<&'static str>,
}

impl Verdict {
    pub fn of(text: &str) -> Self {
        Self {
            looks_like_lease: looks_like_lease(text),
            chars: text.trim().chars().count(),
            keywords: keyword_hits(text),
        }
    }
}

/// Read a document and settle its media type.
///
/// A declared type wins; otherwise content sniffing, then the extension.
pub async fn load_document(path: &Path, declared: Option<&str>) -> Result<RawDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let document = match declared {
        Some(declared) => RawDocument::from_declared(bytes, declared)?,
        None => {
            let media_type = detect(path, &bytes).ok_or_else(|| {
                LeaseError::UnsupportedMediaType(
                    path.extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or("unknown")
                        .to_string(),
                )
            })?;
            RawDocument::new(bytes, media_type)
        }
    };
    Ok(document)
}

pub async fn recover(config: &TenantLensConfig, args: RecoverArgs) -> Result<RecoveredText> {
    let document = load_document(&args.file, args.media_type.as_deref()).await?;
    note_info(&format!(
        "Recovering text from {} ({})",
        args.file.display(),
        document.media_type
    ));
    let recovered = recovery_engine(config).recover(&document).await?;
    Ok(recovered)
}

pub async fn run_recover(config: &TenantLensConfig, args: RecoverArgs) -> Result<()> {
    let recovered = recover(config, args).await?;
    let text = recovered.render();

    if recovered.is_degraded() {
        let pages: Vec<String> = recovered
            .failed_pages
            .iter()
            .map(|i| (i + 1).to_string())
            .collect();
        note_warn(&format!(
            "{} of {} page(s) could not be read: {}",
            recovered.failed_pages.len(),
            recovered.page_count(),
            pages.join(", ")
        ));
    }

    println!("{text}");
    report_verdict(&Verdict::of(&text));
    Ok(())
}

pub async fn run_validate(args: ValidateArgs) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let verdict = Verdict::of(&text);
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    report_verdict(&verdict);
    Ok(())
}

fn report_verdict(verdict: &Verdict) {
    if verdict.looks_like_lease {
        note_info(&format!(
            "Looks like a lease ({} chars, keywords: {})",
            verdict.chars,
            verdict.keywords.join(", ")
        ));
    } else {
        note_warn(&format!(
            "Does not look like a lease ({} chars, {} keyword(s))",
            verdict.chars,
            verdict.keywords.len()
        ));
    }
}
