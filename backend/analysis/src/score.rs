//! Deterministic fairness score.

use tenantlens_core::{ClauseFinding, Severity};

/// Score of a lease with no flagged clauses.
pub const NO_FINDINGS_SCORE: f64 = 85.0;

/// Points deducted for one clause of the given severity.
pub fn penalty(severity: Severity) -> f64 {
    match severity {
        Severity::High => 20.0,
        Severity::Medium => 10.0,
        Severity::Low => 5.0,
        Severity::Unknown => 0.0,
    }
}

/// Score in `[0, 100]`; higher is fairer.
pub fn overall_score(clauses: &[ClauseFinding]) -> f64 {
    if clauses.is_empty() {
        return NO_FINDINGS_SCORE;
    }
    let total: f64 = clauses.iter().map(|c| penalty(c.severity)).sum();
    (100.0 - total).max(0.0)
}
