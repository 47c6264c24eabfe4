//! Lease analysis: chunking, structured extraction, ranking, scoring,
//! recommendations and summary, orchestrated by [`LeaseAnalyzer`].

pub mod aggregate;
pub mod analyzer;
pub mod chunker;
pub mod extract;
pub mod json_recovery;
pub mod recommend;
pub mod score;
pub mod summary;

pub use aggregate::{merge_rights, rank_clauses, MAX_CLAUSES};
pub use analyzer::{AnalyzedDocument, AnalyzerOptions, LeaseAnalyzer};
pub use chunker::chunk_text;
pub use extract::{ClauseExtractor, Extraction, RightsExtractor};
pub use json_recovery::recover_json;
pub use recommend::recommendations;
pub use score::overall_score;
pub use summary::Summarizer;
