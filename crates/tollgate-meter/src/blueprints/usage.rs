//! Non-LLM usage helpers: storage, streams, elapsed time, API calls

use serde_json::json;
use tollgate_common::{IngestResponse, Metadata, Result};

use super::{merge_metadata, Ingestion, SharedEmitter};
use crate::config::BatchConfig;
use crate::metering::{BatchScheduler, FlushReport};

/// Bytes uploaded to object storage
#[derive(Debug, Clone, Default)]
pub struct ObjectStorageUsage {
    pub customer_id: String,
    pub bytes: Option<u64>,
    pub metadata: Option<Metadata>,
}

/// Bytes consumed from a read or write stream
#[derive(Debug, Clone, Default)]
pub struct StreamUsage {
    pub customer_id: String,
    pub bytes: Option<u64>,
    pub metadata: Option<Metadata>,
}

/// Elapsed runtime; any combination of units may be reported
#[derive(Debug, Clone, Default)]
pub struct TimeRangeUsage {
    pub customer_id: String,
    pub duration_ms: Option<u64>,
    pub duration_seconds: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub metadata: Option<Metadata>,
}

/// A single API call at the gateway
#[derive(Debug, Clone, Default)]
pub struct ApiCallUsage {
    pub customer_id: String,
    pub metadata: Option<Metadata>,
}

fn bytes_metadata(bytes: Option<u64>, extra: Option<&Metadata>) -> Metadata {
    let mut base = Metadata::new();
    if let Some(bytes) = bytes {
        base.insert("bytes".into(), json!(bytes));
    }
    merge_metadata(base, extra)
}

pub async fn track_object_storage(
    ingestion: &Ingestion,
    usage: ObjectStorageUsage,
) -> Result<IngestResponse> {
    let metadata = bytes_metadata(usage.bytes, usage.metadata.as_ref());
    ingestion.track(&usage.customer_id, Some(metadata)).await
}

pub async fn track_stream_bytes(ingestion: &Ingestion, usage: StreamUsage) -> Result<IngestResponse> {
    let metadata = bytes_metadata(usage.bytes, usage.metadata.as_ref());
    ingestion.track(&usage.customer_id, Some(metadata)).await
}

pub async fn track_time_range(
    ingestion: &Ingestion,
    usage: TimeRangeUsage,
) -> Result<IngestResponse> {
    let mut base = Metadata::new();
    if let Some(ms) = usage.duration_ms {
        base.insert("durationMs".into(), json!(ms));
    }
    if let Some(seconds) = usage.duration_seconds {
        base.insert("durationSeconds".into(), json!(seconds));
    }
    if let Some(minutes) = usage.duration_minutes {
        base.insert("durationMinutes".into(), json!(minutes));
    }
    let metadata = merge_metadata(base, usage.metadata.as_ref());
    ingestion.track(&usage.customer_id, Some(metadata)).await
}

pub async fn track_api_call(ingestion: &Ingestion, call: ApiCallUsage) -> Result<IngestResponse> {
    ingestion.track(&call.customer_id, call.metadata).await
}

/// Batches API call events for high-volume gateways
#[derive(Clone)]
pub struct ApiCallBatch {
    ingestion: Ingestion,
    scheduler: BatchScheduler<SharedEmitter>,
}

impl ApiCallBatch {
    pub fn add(&self, call: ApiCallUsage) -> Result<()> {
        let event = self
            .ingestion
            .build_event(&call.customer_id, call.metadata.unwrap_or_default());
        event.validate()?;
        self.scheduler.add(event)
    }

    pub async fn flush(&self) -> FlushReport {
        self.scheduler.flush().await
    }

    pub async fn cleanup(&self) -> FlushReport {
        self.scheduler.cleanup().await
    }

    pub fn scheduler(&self) -> &BatchScheduler<SharedEmitter> {
        &self.scheduler
    }
}

/// Create a batch helper for API call tracking
pub fn create_batch(ingestion: &Ingestion, config: BatchConfig) -> ApiCallBatch {
    ApiCallBatch {
        ingestion: ingestion.clone(),
        scheduler: ingestion.batch(config),
    }
}
