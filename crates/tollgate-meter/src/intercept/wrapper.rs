//! Tracking wrapper - transparent surrogate over a client object graph
//!
//! Wrapping is lazy: a container is only wrapped when it is reached
//! through member access, and every access produces a fresh surrogate.
//! Successful calls hand their raw result to the [`UsageTracker`] before
//! being returned; failed calls return the client's error untouched and
//! are never tracked.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tollgate_common::{MeterError, Metadata, Result};
use tracing::{debug, warn};

use super::node::{CallResult, Callable, Container, Node};
use crate::metrics::MeterMetrics;

/// Consumer of successful call results
#[async_trait]
pub trait UsageTracker: Send + Sync {
    async fn track(
        &self,
        response: &Value,
        customer_id: &str,
        metadata: Option<&Metadata>,
    ) -> Result<()>;
}

/// Hook invoked when tracking fails after a successful call
pub type TrackingErrorHook = Arc<dyn Fn(&MeterError) + Send + Sync>;

/// Immutable tracking context threaded through every wrapped node
#[derive(Clone)]
pub struct TrackingContext {
    customer_id: Arc<str>,
    metadata: Option<Arc<Metadata>>,
    tracker: Arc<dyn UsageTracker>,
    metrics: Arc<MeterMetrics>,
    on_error: Option<TrackingErrorHook>,
}

impl TrackingContext {
    pub fn new(tracker: Arc<dyn UsageTracker>, customer_id: impl Into<Arc<str>>) -> Self {
        Self {
            customer_id: customer_id.into(),
            metadata: None,
            tracker,
            metrics: Arc::new(MeterMetrics::default()),
            on_error: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(Arc::new(metadata));
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MeterMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn on_tracking_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&MeterError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_deref()
    }
}

/// Wrap any node with the given tracking context
pub fn wrap(node: Node, ctx: &TrackingContext) -> Node {
    wrap_node(node, ctx, &[])
}

fn wrap_node(node: Node, ctx: &TrackingContext, ancestry: &[usize]) -> Node {
    match node {
        Node::Callable(inner) => Node::Callable(Arc::new(TrackedCallable {
            inner,
            ctx: ctx.clone(),
        })),
        Node::Container(inner) => {
            Node::Container(Arc::new(TrackedContainer::new(inner, ctx.clone(), ancestry)))
        }
        value @ Node::Value(_) => value,
    }
}

/// Surrogate for a client method
pub struct TrackedCallable {
    inner: Arc<dyn Callable>,
    ctx: TrackingContext,
}

#[async_trait]
impl Callable for TrackedCallable {
    async fn call(&self, args: Vec<Value>) -> CallResult {
        // Client errors propagate as-is and skip tracking
        let result = self.inner.call(args).await?;

        let ctx = &self.ctx;
        ctx.metrics.calls_intercepted.inc();
        debug!(customer_id = %ctx.customer_id, "Intercepted call, tracking usage");

        if let Err(e) = ctx
            .tracker
            .track(&result, &ctx.customer_id, ctx.metadata.as_deref())
            .await
        {
            ctx.metrics.tracking_failures.inc();
            warn!(customer_id = %ctx.customer_id, error = %e, code = e.code(), "Usage tracking failed");
            if let Some(hook) = &ctx.on_error {
                hook(&e);
            }
        }

        Ok(result)
    }
}

/// Surrogate for a client object or sub-object
pub struct TrackedContainer {
    inner: Arc<dyn Container>,
    ctx: TrackingContext,
    /// Identities from the root down to this container, cycle-free
    ancestry: Arc<[usize]>,
}

impl TrackedContainer {
    fn new(inner: Arc<dyn Container>, ctx: TrackingContext, parent: &[usize]) -> Self {
        let id = inner.identity();
        let ancestry: Arc<[usize]> = match parent.iter().position(|seen| *seen == id) {
            // Back-edge: continue from the earlier occurrence instead of growing
            Some(pos) => {
                debug!(depth = pos, "Cycle in client graph, reusing ancestor path");
                parent[..=pos].into()
            }
            None => parent.iter().copied().chain(std::iter::once(id)).collect(),
        };
        Self {
            inner,
            ctx,
            ancestry,
        }
    }

    /// Wrap a root client object
    pub fn root(inner: Arc<dyn Container>, ctx: TrackingContext) -> Self {
        Self::new(inner, ctx, &[])
    }

    /// Number of distinct containers between the root and this one (inclusive)
    pub fn depth(&self) -> usize {
        self.ancestry.len()
    }

    pub fn context(&self) -> &TrackingContext {
        &self.ctx
    }

    /// Resolve a dotted path through the surrogate
    pub fn resolve(self: &Arc<Self>, path: &str) -> Option<Node> {
        Node::Container(self.clone()).resolve(path)
    }
}

impl Container for TrackedContainer {
    fn get(&self, name: &str) -> Option<Node> {
        let member = self.inner.get(name)?;
        Some(wrap_node(member, &self.ctx, &self.ancestry))
    }

    fn identity(&self) -> usize {
        self.inner.identity()
    }
}
