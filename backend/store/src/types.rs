use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use tenantlens_core::DocumentAnalysis;

/// Documents scoring below this count as high risk in statistics.
pub const HIGH_RISK_SCORE: f64 = 60.0;

/// Window for the "recent documents" statistic.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// An analyzed lease owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: u64,
    pub owner_id: String,
    pub filename: String,
    pub extracted_text: String,
    pub analysis: DocumentAnalysis,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-owner dashboard numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatistics {
    pub total_documents: usize,
    /// Mean overall score, rounded to one decimal.
    pub average_score: f64,
    pub high_risk_documents: usize,
    pub recent_documents: usize,
}

impl DocumentStatistics {
    /// Statistics over `docs` as of `now`.
    pub fn compute<'a>(docs: impl IntoIterator<Item = &'a StoredDocument>, now: DateTime<Utc>) -> Self {
        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
        let mut stats = Self::default();
        let mut total_score = 0.0;

        for doc in docs {
            stats.total_documents += 1;
            total_score += doc.analysis.overall_score;
            if doc.analysis.overall_score < HIGH_RISK_SCORE {
                stats.high_risk_documents += 1;
            }
            if doc.created_at > cutoff {
                stats.recent_documents += 1;
            }
        }

        if stats.total_documents > 0 {
            let mean = total_score / stats.total_documents as f64;
            stats.average_score = (mean * 10.0).round() / 10.0;
        }
        stats
    }
}
