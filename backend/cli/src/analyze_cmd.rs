//! `analyze` command: document (or plain text) to fairness report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use tenantlens_config::TenantLensConfig;
use tenantlens_core::{DocumentAnalysis, RiskLevel};
use tenantlens_store::{DocumentRepository, DocumentStatistics, InMemoryDocumentRepository};
use tenantlens_understanding::looks_like_lease;

use crate::config::{analysis_language, analyzer};
use crate::recover_cmd::load_document;
use crate::terminal_output::{
    note_success, note_warn, paint, render_table, Column, GREEN, RED, YELLOW,
};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Lease file (PDF, JPEG, PNG or TIFF; plain text with --text)
    pub file: PathBuf,

    /// MIME type, e.g. application/pdf (detected from content/extension otherwise)
    #[arg(long)]
    pub media_type: Option<String>,

    /// Language code for the summary and findings
    #[arg(long)]
    pub language: Option<String>,

    /// Save the result under this owner and print their statistics
    #[arg(long)]
    pub owner: Option<String>,

    /// Treat FILE as already-extracted plain text
    #[arg(long)]
    pub text: bool,

    /// Print a human-readable report instead of JSON
    #[arg(long)]
    pub report: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub id: u64,
    pub statistics: DocumentStatistics,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOutput {
    pub file: String,
    pub risk_level: RiskLevel,
    pub looks_like_lease: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_pages: Vec<usize>,
    pub analysis: DocumentAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored: Option<StoredResult>,
}

pub async fn execute(config: &TenantLensConfig, args: &AnalyzeArgs) -> Result<AnalyzeOutput> {
    let analyzer = analyzer(config)?;
    let language = args
        .language
        .clone()
        .unwrap_or_else(|| analysis_language(config));

    let (text, looks_like_lease, failed_pages, analysis) = if args.text {
        let text = tokio::fs::read_to_string(&args.file)
            .await
            .with_context(|| format!("failed to read {}", args.file.display()))?;
        let verdict = looks_like_lease(&text);
        let analysis = analyzer.analyze(&text, &language).await;
        (text, verdict, Vec::new(), analysis)
    } else {
        let document = load_document(&args.file, args.media_type.as_deref()).await?;
        let analyzed = analyzer.analyze_document(&document, &language).await?;
        (
            analyzed.text,
            analyzed.looks_like_lease,
            analyzed.recovered.failed_pages,
            analyzed.analysis,
        )
    };

    let file = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let stored = match &args.owner {
        Some(owner) => {
            let repository = InMemoryDocumentRepository::new();
            let id = repository
                .save(owner, &file, &text, analysis.clone())
                .await?;
            let statistics = repository.statistics(owner).await?;
            info!(id, owner = %owner, "Stored analysis");
            Some(StoredResult { id, statistics })
        }
        None => None,
    };

    Ok(AnalyzeOutput {
        file,
        risk_level: analysis.risk_level(),
        looks_like_lease,
        failed_pages,
        analysis,
        stored,
    })
}

pub async fn run(config: &TenantLensConfig, args: AnalyzeArgs) -> Result<()> {
    let output = execute(config, &args).await?;

    if !output.looks_like_lease {
        note_warn("The text does not look like a lease; results may be meaningless");
    }
    if !output.failed_pages.is_empty() {
        note_warn(&format!(
            "{} page(s) could not be read and were skipped",
            output.failed_pages.len()
        ));
    }
    if output.analysis.is_degraded() {
        note_warn(&format!(
            "{} chunk(s) could not be analyzed; the report is incomplete",
            output.analysis.degraded_chunks
        ));
    }

    if args.report {
        print!("{}", render_report(&output));
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if let Some(stored) = &output.stored {
        note_success(&format!("Saved as document {}", stored.id));
    }
    Ok(())
}

fn risk_color(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => RED,
        RiskLevel::Medium => YELLOW,
        RiskLevel::Low => GREEN,
    }
}

/// Human-readable rendering of an analysis.
pub fn render_report(output: &AnalyzeOutput) -> String {
    let analysis = &output.analysis;
    let mut out = String::new();

    out.push_str(&format!(
        "{}\nScore: {:.0}/100  Risk: {}\n\n",
        output.file,
        analysis.overall_score,
        paint(&output.risk_level.to_string(), risk_color(output.risk_level)),
    ));

    out.push_str("Summary\n");
    out.push_str(analysis.plain_english_summary.trim());
    out.push_str("\n\n");

    if !analysis.unfair_clauses.is_empty() {
        out.push_str("Unfair clauses\n");
        let columns = [
            Column::left("Severity"),
            Column::left("Issue").with_max_width(40),
            Column::left("Recommendation").with_max_width(60),
        ];
        let rows: Vec<Vec<String>> = analysis
            .unfair_clauses
            .iter()
            .map(|c| {
                vec![
                    c.severity.to_string(),
                    c.issue.clone(),
                    c.recommendation.clone(),
                ]
            })
            .collect();
        out.push_str(&render_table(&columns, &rows));
        out.push('\n');
    }

    if !analysis.tenant_rights.is_empty() {
        out.push_str("Tenant rights\n");
        let columns = [
            Column::left("Importance"),
            Column::left("Right").with_max_width(40),
            Column::left("Description").with_max_width(60),
        ];
        let rows: Vec<Vec<String>> = analysis
            .tenant_rights
            .iter()
            .map(|r| {
                vec![
                    r.importance.to_string(),
                    r.title.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        out.push_str(&render_table(&columns, &rows));
        out.push('\n');
    }

    out.push_str("Recommendations\n");
    for (i, rec) in analysis.recommendations.iter().enumerate() {
        out.push_str(&format!("  {}. {rec}\n", i + 1));
    }

    if let Some(stored) = &output.stored {
        let stats = &stored.statistics;
        out.push_str(&format!(
            "\nDocuments: {}  Average score: {:.1}  High risk: {}  Last 30 days: {}\n",
            stats.total_documents,
            stats.average_score,
            stats.high_risk_documents,
            stats.recent_documents
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal_output::strip_ansi;
    use tenantlens_config::{apply_all_defaults, ProviderConfig};

    const LEASE: &str = "RESIDENTIAL LEASE AGREEMENT\n\nThe Tenant shall pay monthly rent of \
        $1,200 to the Landlord. A security deposit of $1,200 is due at signing. The \
        premises may not be sublet without written consent.";

    fn mock_config() -> TenantLensConfig {
        apply_all_defaults(TenantLensConfig {
            provider: Some(ProviderConfig {
                name: Some("mock".into()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn text_args(file: PathBuf, owner: Option<&str>) -> AnalyzeArgs {
        AnalyzeArgs {
            file,
            media_type: None,
            language: None,
            owner: owner.map(str::to_string),
            text: true,
            report: false,
        }
    }

    #[tokio::test]
    async fn analyzes_plain_text_with_mock_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lease.txt");
        std::fs::write(&path, LEASE).unwrap();

        let output = execute(&mock_config(), &text_args(path, None)).await.unwrap();

        assert_eq!(output.file, "lease.txt");
        assert!(output.looks_like_lease);
        assert!(output.analysis.unfair_clauses.is_empty());
        assert_eq!(output.analysis.overall_score, 85.0);
        assert_eq!(output.risk_level, RiskLevel::Low);
        assert!(output.stored.is_none());

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["riskLevel"], "low");
        assert!(json.get("failedPages").is_none());
    }

    #[tokio::test]
    async fn owner_gets_stored_result_and_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lease.txt");
        std::fs::write(&path, LEASE).unwrap();

        let output = execute(&mock_config(), &text_args(path, Some("tenant-7")))
            .await
            .unwrap();

        let stored = output.stored.as_ref().unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.statistics.total_documents, 1);
        assert_eq!(stored.statistics.average_score, 85.0);
        assert_eq!(stored.statistics.high_risk_documents, 0);

        let report = strip_ansi(&render_report(&output));
        assert!(report.contains("Score: 85/100  Risk: low"));
        assert!(report.contains("Documents: 1"));
    }

    #[tokio::test]
    async fn unsupported_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lease.txt");
        std::fs::write(&path, LEASE).unwrap();

        let mut args = text_args(path, None);
        args.text = false;
        let err = execute(&mock_config(), &args).await.unwrap_err();
        assert!(err.to_string().contains("unsupported media type"));
    }
}
