//! LLM token tracking
//!
//! [`LlmTracker`] turns provider responses into token usage events and
//! hands them to the emitter, either one by one or through a
//! [`BatchScheduler`]. It is created once and reused across customers;
//! [`LlmTracker::wrap`] gives each customer a tracked view of a client.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tollgate_common::{
    EventIdGenerator, MeterError, Metadata, Result, TrackingEvent, UsageRecord, LLM_EVENT_PREFIX,
};
use tracing::{debug, instrument, warn};

use super::{merge_metadata, SharedEmitter};
use crate::config::{BatchConfig, MeterConfig};
use crate::emitter::EventEmitter;
use crate::intercept::{wrap, Container, Node, TrackedContainer, TrackingContext, UsageTracker};
use crate::metering::{extract_usage, BatchScheduler, FlushReport};
use crate::metrics::MeterMetrics;

/// Tracks LLM usage by extracting tokens and emitting a usage event
pub struct LlmTracker {
    emitter: SharedEmitter,
    batch: Option<BatchScheduler<SharedEmitter>>,
    event_name: String,
    ids: EventIdGenerator,
    metrics: Arc<MeterMetrics>,
}

impl LlmTracker {
    /// Create a tracker delivering each event directly
    pub fn new(config: &MeterConfig, emitter: SharedEmitter) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            emitter,
            batch: None,
            event_name: config.event_name.clone(),
            ids: EventIdGenerator::new(LLM_EVENT_PREFIX),
            metrics: Arc::new(MeterMetrics::default()),
        })
    }

    /// Share a metrics instance (call before `with_batching`)
    pub fn with_metrics(mut self, metrics: Arc<MeterMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Route events through a batch scheduler instead of direct submission
    pub fn with_batching(mut self, config: BatchConfig) -> Self {
        let scheduler = BatchScheduler::builder(self.emitter.clone())
            .config(config)
            .metrics(self.metrics.clone())
            .build();
        self.batch = Some(scheduler);
        self
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn metrics(&self) -> &Arc<MeterMetrics> {
        &self.metrics
    }

    pub fn batch(&self) -> Option<&BatchScheduler<SharedEmitter>> {
        self.batch.as_ref()
    }

    /// Build the event for a usage record; caller metadata overrides usage keys
    pub fn build_event(
        &self,
        usage: &UsageRecord,
        customer_id: &str,
        metadata: Option<&Metadata>,
    ) -> TrackingEvent {
        let metadata = merge_metadata(usage.to_metadata(), metadata);
        TrackingEvent::new(&self.ids, customer_id, self.event_name.as_str(), metadata)
    }

    /// Track token usage for any LLM response; responses without usage are skipped
    #[instrument(skip(self, response, metadata))]
    pub async fn track(
        &self,
        response: &Value,
        customer_id: &str,
        metadata: Option<&Metadata>,
    ) -> Result<()> {
        let Some(usage) = extract_usage(response) else {
            self.metrics.responses_without_usage.inc();
            debug!("No usage in response, skipping");
            return Ok(());
        };

        let event = self.build_event(&usage, customer_id, metadata);
        event.validate()?;
        self.metrics.events_tracked.inc();
        debug!(
            event_id = %event.event_id(),
            input = usage.input_tokens,
            output = usage.output_tokens,
            model = %usage.model,
            "Tracking token usage"
        );

        match &self.batch {
            Some(batch) => batch.add(event),
            None => {
                let event_id = event.event_id().to_string();
                match self.emitter.submit(vec![event]).await {
                    Ok(response) if response.success => {
                        self.metrics.events_delivered.inc();
                        Ok(())
                    }
                    Ok(response) => {
                        self.metrics.delivery_failures.inc();
                        warn!(event_id = %event_id, "Emitter reported unsuccessful delivery");
                        let reason = response
                            .errors
                            .iter()
                            .map(|f| f.error.as_str())
                            .collect::<Vec<_>>()
                            .join("; ");
                        Err(MeterError::api(
                            422,
                            format!("Event {} was not ingested: {}", event_id, reason),
                        ))
                    }
                    Err(e) => {
                        self.metrics.delivery_failures.inc();
                        Err(e)
                    }
                }
            }
        }
    }

    /// Wrap a client node so its successful calls are tracked for `customer_id`
    pub fn wrap(
        self: &Arc<Self>,
        client: Node,
        customer_id: &str,
        metadata: Option<Metadata>,
    ) -> Node {
        wrap(client, &self.context(customer_id, metadata))
    }

    /// Wrap a root client object, keeping the concrete surrogate type
    pub fn wrap_client(
        self: &Arc<Self>,
        client: Arc<dyn Container>,
        customer_id: &str,
        metadata: Option<Metadata>,
    ) -> Arc<TrackedContainer> {
        Arc::new(TrackedContainer::root(
            client,
            self.context(customer_id, metadata),
        ))
    }

    fn context(self: &Arc<Self>, customer_id: &str, metadata: Option<Metadata>) -> TrackingContext {
        let ctx = TrackingContext::new(self.clone(), customer_id).with_metrics(self.metrics.clone());
        match metadata {
            Some(metadata) => ctx.with_metadata(metadata),
            None => ctx,
        }
    }

    pub async fn health_check(&self) -> bool {
        self.emitter.health_check().await
    }

    /// Flush and retire the batch scheduler, if any
    pub async fn shutdown(&self) -> Option<FlushReport> {
        match &self.batch {
            Some(batch) => Some(batch.cleanup().await),
            None => None,
        }
    }
}

#[async_trait]
impl UsageTracker for LlmTracker {
    async fn track(
        &self,
        response: &Value,
        customer_id: &str,
        metadata: Option<&Metadata>,
    ) -> Result<()> {
        LlmTracker::track(self, response, customer_id, metadata).await
    }
}

/// Validate configuration and create a shareable LLM tracker
pub fn create_llm_tracker(config: MeterConfig, emitter: SharedEmitter) -> Result<Arc<LlmTracker>> {
    Ok(Arc::new(LlmTracker::new(&config, emitter)?))
}
