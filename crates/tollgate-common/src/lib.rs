//! # Tollgate Common
//!
//! Shared types and errors for Tollgate usage metering.
//!
//! ## Core Types
//!
//! - [`TrackingEvent`]: Billing-facing unit submitted to an emitter
//! - [`UsageRecord`]: Canonical token counts extracted from a provider response
//! - [`IngestResponse`]: Normalized result of an event submission
//! - [`EventIdGenerator`]: Collision-free event identifiers
//!
//! ## Errors
//!
//! - [`MeterError`]: Unified error taxonomy (validation, API, configuration, provider)

pub mod error;
pub mod id;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{MeterError, Result};
pub use id::EventIdGenerator;
pub use types::{
    event::{Metadata, TrackingEvent},
    ingest::{EventFailure, IngestResponse},
    usage::UsageRecord,
};

/// Tollgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of queued events that triggers an immediate flush
pub const DEFAULT_BATCH_MAX_SIZE: usize = 100;

/// Default debounce interval before a deferred flush fires (milliseconds)
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5000;

/// Model name reported when a response carries none
pub const UNKNOWN_MODEL: &str = "unknown";

/// Event id prefix used for LLM token events
pub const LLM_EVENT_PREFIX: &str = "llm";
