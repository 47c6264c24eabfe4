//! Analysis Event Logger
//!
//! Structured pipeline events (page recovery, chunk extraction, completion)
//! emitted through `tracing` under the `analysis_events` target, so the NDJSON
//! file layer can be filtered down to them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

pub const EVENT_TARGET: &str = "analysis_events";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AnalysisEvent {
    PageRecovered {
        page: usize,
        chars: usize,
    },
    PageFailed {
        page: usize,
        error: String,
    },
    ChunkExtracted {
        chunk: usize,
        clauses: usize,
        rights: usize,
    },
    ChunkDegraded {
        chunk: usize,
        reason: String,
    },
    AnalysisCompleted {
        chunks: usize,
        clauses: usize,
        rights: usize,
        score: f64,
        degraded_chunks: usize,
    },
}

impl AnalysisEvent {
    fn is_failure(&self) -> bool {
        matches!(self, Self::PageFailed { .. } | Self::ChunkDegraded { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: AnalysisEvent,
}

pub struct AnalysisEventLogger;

impl AnalysisEventLogger {
    /// Log a pipeline event, redacting any free-text error contents first.
    pub fn log_event(mut event: AnalysisEvent) {
        match &mut event {
            AnalysisEvent::PageFailed { error, .. } => {
                *error = redact_sensitive_data(error);
            }
            AnalysisEvent::ChunkDegraded { reason, .. } => {
                *reason = redact_sensitive_data(reason);
            }
            _ => {}
        }

        let failure = event.is_failure();
        let entry = EventLogEntry {
            timestamp: Utc::now(),
            event,
        };
        let payload = serde_json::to_string(&entry).unwrap_or_default();

        if failure {
            warn!(target: EVENT_TARGET, event = %payload, "Analysis pipeline event");
        } else {
            info!(target: EVENT_TARGET, event = %payload, "Analysis pipeline event");
        }
    }
}
