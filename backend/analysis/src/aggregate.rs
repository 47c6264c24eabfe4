//! Cross-chunk aggregation and ranking.

use tenantlens_core::{ClauseFinding, RightFinding};

/// Maximum clauses kept in a final analysis.
pub const MAX_CLAUSES: usize = 20;

/// Merge per-chunk clause findings, most severe first, capped at `max_clauses`.
///
/// The sort is stable, so findings of equal severity stay in chunk order.
pub fn rank_clauses(per_chunk: Vec<Vec<ClauseFinding>>, max_clauses: usize) -> Vec<ClauseFinding> {
    let mut clauses: Vec<ClauseFinding> = per_chunk.into_iter().flatten().collect();
    clauses.sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank()));
    clauses.truncate(max_clauses);
    clauses
}

/// Concatenate per-chunk rights in chunk order. No dedup, no cap.
pub fn merge_rights(per_chunk: Vec<Vec<RightFinding>>) -> Vec<RightFinding> {
    per_chunk.into_iter().flatten().collect()
}
