pub mod error;
pub mod traits;
pub mod types;

pub use error::{LeaseError, RecoveryStage};
pub use traits::{LlmProvider, LlmRequest, LlmResponse};
pub use types::{
    ClauseFinding, DocumentAnalysis, Importance, LlmPolicy, MediaType, PageText, RawDocument,
    RecoveredText, RightFinding, RiskLevel, Severity, TextChunk,
};
