//! TrackingEvent - the billing-facing unit of usage
//!
//! Events are immutable once built: fields are only readable through
//! accessors, and every mutation path produces a new event.

use crate::error::{MeterError, Result};
use crate::id::EventIdGenerator;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Free-form event metadata used for filtering and aggregation
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Usage event submitted to the billing backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Unique identifier for this specific event
    event_id: String,
    /// Customer the usage is billed to
    customer_id: String,
    /// Event name that triggers the meter
    event_name: String,
    /// ISO 8601 timestamp when the event occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    /// Additional properties for filtering and aggregation
    #[serde(default)]
    metadata: Metadata,
}

impl TrackingEvent {
    /// Create a new event stamped with the current time
    pub fn new(
        ids: &EventIdGenerator,
        customer_id: impl Into<String>,
        event_name: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            event_id: ids.next_id(),
            customer_id: customer_id.into(),
            event_name: event_name.into(),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            metadata,
        }
    }

    /// Assemble an event from raw parts without generating anything.
    ///
    /// No validation happens here; emitters call [`TrackingEvent::validate`]
    /// before submission.
    pub fn from_parts(
        event_id: impl Into<String>,
        customer_id: impl Into<String>,
        event_name: impl Into<String>,
        timestamp: Option<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            customer_id: customer_id.into(),
            event_name: event_name.into(),
            timestamp,
            metadata,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Validate the event structure
    pub fn validate(&self) -> Result<()> {
        if self.event_id.is_empty() {
            return Err(MeterError::Validation("event_id is required".into()));
        }
        if self.customer_id.is_empty() {
            return Err(MeterError::Validation("customer_id is required".into()));
        }
        if self.event_name.is_empty() {
            return Err(MeterError::Validation("event_name is required".into()));
        }
        if let Some(ts) = &self.timestamp {
            if !is_iso8601(ts) {
                return Err(MeterError::Validation(
                    "timestamp must be a valid ISO 8601 date string".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Offset date-times, offset-less local date-times and bare dates
fn is_iso8601(ts: &str) -> bool {
    DateTime::parse_from_rfc3339(ts).is_ok()
        || NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M").is_ok()
        || NaiveDate::parse_from_str(ts, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: serde_json::Value) -> Metadata {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_event_creation() {
        let ids = EventIdGenerator::new("api_request");
        let event = TrackingEvent::new(&ids, "cus_123", "api_request", metadata(json!({"path": "/v1"})));

        assert!(event.event_id().starts_with("api_request_"));
        assert_eq!(event.customer_id(), "cus_123");
        assert_eq!(event.metadata()["path"], "/v1");
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_event_validation() {
        let missing_customer = TrackingEvent::from_parts("id_1", "", "api", None, Metadata::new());
        let err = missing_customer.validate().unwrap_err();
        assert!(err.to_string().contains("customer_id"));

        let missing_id = TrackingEvent::from_parts("", "cus", "api", None, Metadata::new());
        assert!(missing_id.validate().unwrap_err().to_string().contains("event_id"));

        let missing_name = TrackingEvent::from_parts("id_1", "cus", "", None, Metadata::new());
        assert!(missing_name.validate().unwrap_err().to_string().contains("event_name"));
    }

    #[test]
    fn test_timestamp_validation() {
        let bad = TrackingEvent::from_parts(
            "id_1",
            "cus",
            "api",
            Some("yesterday".into()),
            Metadata::new(),
        );
        assert!(matches!(bad.validate(), Err(MeterError::Validation(_))));

        let good = TrackingEvent::from_parts(
            "id_1",
            "cus",
            "api",
            Some("2024-05-01T12:30:00.000Z".into()),
            Metadata::new(),
        );
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_timestamp_accepts_iso8601_variants() {
        let event = |ts: &str| {
            TrackingEvent::from_parts("id_1", "cus", "api", Some(ts.into()), Metadata::new())
        };

        for ts in [
            "2024-05-01T12:30:00+02:00",
            "2024-05-01T12:30:00",
            "2024-05-01T12:30:00.250",
            "2024-05-01T12:30",
            "2024-05-01",
        ] {
            assert!(event(ts).validate().is_ok(), "{} should be accepted", ts);
        }

        for ts in ["2024-13-01", "2024-05-01T25:00:00", "05/01/2024", ""] {
            assert!(event(ts).validate().is_err(), "{} should be rejected", ts);
        }
    }

    #[test]
    fn test_serialized_shape() {
        let event = TrackingEvent::from_parts("id_1", "cus", "api", None, Metadata::new());
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event_id"], "id_1");
        assert!(value.get("timestamp").is_none());
        assert!(value["metadata"].as_object().unwrap().is_empty());
    }
}
