//! Normalized ingestion results

use serde::{Deserialize, Serialize};

/// Per-event failure reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFailure {
    pub event_id: String,
    pub error: String,
}

/// Normalized response returned after ingesting events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub events_processed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EventFailure>,
}

impl IngestResponse {
    /// Successful submission of `events_processed` events
    pub fn accepted(events_processed: usize) -> Self {
        Self {
            success: true,
            events_processed,
            errors: Vec::new(),
        }
    }

    /// Attach backend-reported per-event failures
    pub fn with_errors(mut self, errors: Vec<EventFailure>) -> Self {
        self.errors = errors;
        self
    }
}
