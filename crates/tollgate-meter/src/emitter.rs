//! Event emitter abstraction
//!
//! The emitter is the only collaborator the metering layer talks to. It
//! accepts finished [`TrackingEvent`]s and reports success or failure;
//! transport, retries and authentication live behind it.

use async_trait::async_trait;
use std::sync::Arc;
use tollgate_common::{IngestResponse, Result, TrackingEvent};

#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Submit a batch of events to the billing backend
    async fn submit(&self, events: Vec<TrackingEvent>) -> Result<IngestResponse>;

    /// Probe backend reachability and credentials
    async fn health_check(&self) -> bool;
}

#[async_trait]
impl<E: EventEmitter + ?Sized> EventEmitter for Arc<E> {
    async fn submit(&self, events: Vec<TrackingEvent>) -> Result<IngestResponse> {
        (**self).submit(events).await
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }
}
