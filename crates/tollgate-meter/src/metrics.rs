//! Prometheus counters for the metering layer

use tollgate_common::{MeterError, Result};

/// Prometheus metrics for interception, tracking and delivery
pub struct MeterMetrics {
    pub calls_intercepted: prometheus::IntCounter,
    pub events_tracked: prometheus::IntCounter,
    pub responses_without_usage: prometheus::IntCounter,
    pub tracking_failures: prometheus::IntCounter,
    pub events_delivered: prometheus::IntCounter,
    pub delivery_failures: prometheus::IntCounter,
    pub flushes: prometheus::IntCounter,
}

fn counter(name: &str, help: &str) -> prometheus::IntCounter {
    prometheus::IntCounter::new(name, help).expect("static metric definition")
}

impl MeterMetrics {
    pub fn new() -> Self {
        Self {
            calls_intercepted: counter(
                "tollgate_calls_intercepted_total",
                "Wrapped client calls that completed successfully",
            ),
            events_tracked: counter(
                "tollgate_events_tracked_total",
                "Tracking events built from responses",
            ),
            responses_without_usage: counter(
                "tollgate_responses_without_usage_total",
                "Responses skipped because no usage was found",
            ),
            tracking_failures: counter(
                "tollgate_tracking_failures_total",
                "Tracking calls that failed after a successful client call",
            ),
            events_delivered: counter(
                "tollgate_events_delivered_total",
                "Events accepted by the emitter",
            ),
            delivery_failures: counter(
                "tollgate_delivery_failures_total",
                "Events the emitter failed to deliver",
            ),
            flushes: counter("tollgate_flushes_total", "Non-empty batch flushes"),
        }
    }

    pub fn register(&self, registry: &prometheus::Registry) -> Result<()> {
        let collectors = [
            &self.calls_intercepted,
            &self.events_tracked,
            &self.responses_without_usage,
            &self.tracking_failures,
            &self.events_delivered,
            &self.delivery_failures,
            &self.flushes,
        ];
        for c in collectors {
            registry
                .register(Box::new(c.clone()))
                .map_err(|e| MeterError::Internal(format!("metric registration failed: {}", e)))?;
        }
        Ok(())
    }
}

impl Default for MeterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_once() {
        let registry = prometheus::Registry::new();
        let metrics = MeterMetrics::new();
        metrics.register(&registry).unwrap();

        metrics.flushes.inc();
        let families = registry.gather();
        assert_eq!(families.len(), 7);

        // Registering the same collectors twice is rejected
        assert!(metrics.register(&registry).is_err());
    }
}
