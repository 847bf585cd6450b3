//! # Tollgate Meter
//!
//! Usage metering for arbitrary client objects: calls are intercepted,
//! responses normalized into token counts, and usage events delivered to
//! a billing backend directly or in batches.
//!
//! ## Data Flow
//!
//! ```text
//! caller ──▶ TrackedContainer / TrackedCallable ──▶ original client method
//!                       │ (success only)
//!                       ▼
//!                 UsageTracker::track
//!                       │
//!              extract_usage (normalizer) ──▶ None: skip
//!                       │
//!                 TrackingEvent
//!                       │
//!        ┌──────────────┴──────────────┐
//!        ▼                             ▼
//!  EventEmitter::submit        BatchScheduler::add ──▶ EventEmitter::submit
//! ```
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo(emitter: tollgate_meter::SharedEmitter) -> tollgate_common::Result<()> {
//! use serde_json::json;
//! use tollgate_meter::{create_llm_tracker, MeterConfig, ObjectNode};
//!
//! let tracker = create_llm_tracker(MeterConfig::new("sk_test", "llm_tokens"), emitter)?;
//!
//! let client = ObjectNode::new()
//!     .with_object(
//!         "chat",
//!         ObjectNode::new().with_method("create", |_args| async {
//!             Ok(json!({"model": "gpt-4o", "usage": {"prompt_tokens": 12, "completion_tokens": 4}}))
//!         }),
//!     )
//!     .into_node();
//!
//! let wrapped = tracker.wrap(client, "cus_123", None);
//! if let Some(create) = wrapped.resolve("chat.create") {
//!     let _response = create.call(vec![json!({"messages": []})]).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod blueprints;
pub mod config;
pub mod emitter;
pub mod ingest;
pub mod intercept;
pub mod metering;
pub mod metrics;

pub use blueprints::{create_llm_tracker, Ingestion, LlmTracker, SharedEmitter};
pub use config::{BatchConfig, Environment, MeterConfig};
pub use emitter::EventEmitter;
pub use ingest::{IngestionClient, Transport, TransportError};
pub use intercept::{
    wrap, CallResult, Callable, ClientError, Container, Node, ObjectNode, TrackedContainer,
    TrackingContext, UsageTracker,
};
pub use metering::{
    extract_usage, BatchScheduler, FailurePolicy, FlushReport, SchedulerState, UsageSchema,
};
pub use metrics::MeterMetrics;
