//! Usage blueprints
//!
//! Ready-made tracking helpers organized by usage type:
//! - LLM token usage (interception + normalization)
//! - Object storage uploads, stream bytes, elapsed time, API calls

pub mod llm;
pub mod usage;

use std::sync::Arc;
use tollgate_common::{EventIdGenerator, IngestResponse, Metadata, Result, TrackingEvent};
use tracing::{debug, instrument};

use crate::config::{BatchConfig, MeterConfig};
use crate::emitter::EventEmitter;
use crate::metering::BatchScheduler;

pub use llm::{create_llm_tracker, LlmTracker};
pub use usage::{
    create_batch, track_api_call, track_object_storage, track_stream_bytes, track_time_range,
    ApiCallBatch, ApiCallUsage, ObjectStorageUsage, StreamUsage, TimeRangeUsage,
};

/// Emitter shared between trackers, schedulers and wrapped clients
pub type SharedEmitter = Arc<dyn EventEmitter>;

/// Overlay caller metadata on top of blueprint-provided keys
pub(crate) fn merge_metadata(mut base: Metadata, overrides: Option<&Metadata>) -> Metadata {
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}

/// Generic usage ingestion for a single meter
#[derive(Clone)]
pub struct Ingestion {
    emitter: SharedEmitter,
    event_name: String,
    ids: EventIdGenerator,
}

impl Ingestion {
    pub fn new(config: &MeterConfig, emitter: SharedEmitter) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            emitter,
            event_name: config.event_name.clone(),
            ids: EventIdGenerator::new(config.event_name.as_str()),
        })
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Build an event for this meter; ids are prefixed with the event name
    pub fn build_event(&self, customer_id: &str, metadata: Metadata) -> TrackingEvent {
        TrackingEvent::new(&self.ids, customer_id, self.event_name.as_str(), metadata)
    }

    /// Track a usage event immediately
    #[instrument(skip(self, metadata))]
    pub async fn track(
        &self,
        customer_id: &str,
        metadata: Option<Metadata>,
    ) -> Result<IngestResponse> {
        let event = self.build_event(customer_id, metadata.unwrap_or_default());
        debug!(event_id = %event.event_id(), "Tracking usage event");
        self.emitter.submit(vec![event]).await
    }

    /// Scheduler batching events for this meter's emitter
    pub fn batch(&self, config: BatchConfig) -> BatchScheduler<SharedEmitter> {
        BatchScheduler::new(self.emitter.clone(), config)
    }

    pub async fn health_check(&self) -> bool {
        self.emitter.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_metadata_overrides() {
        let mut base = Metadata::new();
        base.insert("bytes".into(), json!(10));
        base.insert("region".into(), json!("eu"));

        let mut overrides = Metadata::new();
        overrides.insert("bytes".into(), json!(20));

        let merged = merge_metadata(base, Some(&overrides));
        assert_eq!(merged["bytes"], 20);
        assert_eq!(merged["region"], "eu");
    }
}
