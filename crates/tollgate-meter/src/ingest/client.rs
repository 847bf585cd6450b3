//! Ingestion client
//!
//! Validates usage events locally, hands them to a [`Transport`], and
//! normalizes the backend reply into an [`IngestResponse`]:
//! - Local validation before any network call
//! - Backend failures mapped to API errors with their status
//! - Health probing that tells misconfiguration apart from outages

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tollgate_common::{EventFailure, IngestResponse, MeterError, Result, TrackingEvent};
use tracing::{debug, instrument, warn};

use crate::config::{Environment, MeterConfig};
use crate::emitter::EventEmitter;

/// Failure reported by a transport
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status when the backend answered, `None` for network failures
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

/// Network collaborator that actually talks to the billing backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one ingestion request and return the raw backend reply
    async fn ingest(&self, events: &[TrackingEvent]) -> std::result::Result<Value, TransportError>;

    /// Issue a cheap authenticated request (e.g. list one event)
    async fn probe(&self) -> std::result::Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn ingest(&self, events: &[TrackingEvent]) -> std::result::Result<Value, TransportError> {
        (**self).ingest(events).await
    }

    async fn probe(&self) -> std::result::Result<(), TransportError> {
        (**self).probe().await
    }
}

/// Client information for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub environment: Environment,
    pub sdk_version: &'static str,
}

/// Validating emitter over a transport
pub struct IngestionClient<T> {
    transport: T,
    environment: Environment,
}

impl<T: Transport> IngestionClient<T> {
    pub fn new(transport: T, environment: Environment) -> Self {
        Self {
            transport,
            environment,
        }
    }

    /// Build a client from a validated tracker configuration
    pub fn from_config(config: &MeterConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(transport, config.environment))
    }

    /// Submit a single event
    pub async fn ingest_event(&self, event: TrackingEvent) -> Result<IngestResponse> {
        self.ingest_events(vec![event]).await
    }

    /// Submit events to the ingestion endpoint
    #[instrument(skip(self, events), fields(count = events.len()))]
    pub async fn ingest_events(&self, events: Vec<TrackingEvent>) -> Result<IngestResponse> {
        if events.is_empty() {
            return Err(MeterError::Validation(
                "At least one event is required".into(),
            ));
        }

        for event in &events {
            event.validate()?;
        }

        let reply = self.transport.ingest(&events).await.map_err(|e| match e.status {
            Some(status) => {
                warn!(status, error = %e, "Backend rejected events");
                MeterError::api(status, e.message)
            }
            None => {
                warn!(error = %e, "Event submission failed");
                MeterError::api(0, format!("Failed to submit events: {}", e.message))
            }
        })?;

        let response = normalize_reply(&reply, events.len());
        debug!(
            processed = response.events_processed,
            failed = response.errors.len(),
            "Events ingested"
        );
        Ok(response)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn client_info(&self) -> ClientInfo {
        ClientInfo {
            environment: self.environment,
            sdk_version: tollgate_common::VERSION,
        }
    }
}

/// Merge backend-reported fields over the locally known defaults
fn normalize_reply(reply: &Value, submitted: usize) -> IngestResponse {
    let processed = reply
        .get("events_processed")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(submitted);

    let mut response = IngestResponse::accepted(processed);
    if let Some(success) = reply.get("success").and_then(Value::as_bool) {
        response.success = success;
    }

    let errors = reply
        .get("errors")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    Some(EventFailure {
                        event_id: entry.get("event_id")?.as_str()?.to_string(),
                        error: entry
                            .get("error")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    response.with_errors(errors)
}

#[async_trait]
impl<T: Transport> EventEmitter for IngestionClient<T> {
    async fn submit(&self, events: Vec<TrackingEvent>) -> Result<IngestResponse> {
        self.ingest_events(events).await
    }

    /// 4xx means reachable but misconfigured; 5xx and network failures mean unreachable
    async fn health_check(&self) -> bool {
        match self.transport.probe().await {
            Ok(()) => true,
            Err(TransportError {
                status: Some(status),
                ..
            }) if (400..500).contains(&status) => true,
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}
