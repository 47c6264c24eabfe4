//! Storage of analyzed lease documents, scoped per owner.

pub mod store;
pub mod types;

pub use store::{DocumentRepository, InMemoryDocumentRepository};
pub use types::{DocumentStatistics, StoredDocument, HIGH_RISK_SCORE, RECENT_WINDOW_DAYS};
