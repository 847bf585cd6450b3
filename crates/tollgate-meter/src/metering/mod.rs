//! Metering module
//!
//! Provides usage extraction and event batching:
//! - Normalizer: Extracts a canonical usage record from provider responses
//! - BatchScheduler: Accumulates events and flushes them by size or time

pub mod batch;
pub mod normalizer;

pub use batch::{
    BatchScheduler, BatchSchedulerBuilder, BatchStats, FailureCallback, FailurePolicy,
    FlushReport, FlushTrigger, SchedulerState,
};
pub use normalizer::{detect_schema, extract_usage, UsageSchema};
