//! Telemetry and structured logging components for TenantLens.
//!
//! Handles log redaction, console/NDJSON output, file rotation, and analysis
//! pipeline event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{AnalysisEvent, AnalysisEventLogger, EventLogEntry};
pub use logger::init_logger;
pub use redact::{excerpt, redact_sensitive_data};
