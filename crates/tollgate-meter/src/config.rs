//! Metering configuration
//!
//! Construction-time settings are validated eagerly so a misconfigured
//! tracker fails before any client is wrapped.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tollgate_common::{MeterError, Result, DEFAULT_BATCH_MAX_SIZE, DEFAULT_FLUSH_INTERVAL_MS};

use crate::metering::batch::FailurePolicy;

/// Billing backend environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    TestMode,
    LiveMode,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::TestMode => "test_mode",
            Environment::LiveMode => "live_mode",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "test_mode" => Ok(Environment::TestMode),
            "live_mode" => Ok(Environment::LiveMode),
            other => Err(MeterError::Configuration(format!(
                "environment must be test_mode or live_mode, got {:?}",
                other
            ))),
        }
    }
}

/// Tracker configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    /// Billing backend API key
    pub api_key: String,
    /// Backend environment
    #[serde(default)]
    pub environment: Environment,
    /// Event name for the meter (e.g. `llm_tokens`, `api_request`)
    pub event_name: String,
}

impl std::fmt::Debug for MeterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeterConfig")
            .field("api_key", &"<redacted>")
            .field("environment", &self.environment)
            .field("event_name", &self.event_name)
            .finish()
    }
}

impl MeterConfig {
    pub fn new(api_key: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            environment: Environment::default(),
            event_name: event_name.into(),
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Load configuration from environment variables (and a `.env` file if present)
    ///
    /// Reads `TOLLGATE_API_KEY`, `TOLLGATE_EVENT_NAME` and the optional
    /// `TOLLGATE_ENVIRONMENT`. The result is validated before returning.
    pub fn from_env() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let api_key = std::env::var("TOLLGATE_API_KEY").unwrap_or_default();
        let event_name = std::env::var("TOLLGATE_EVENT_NAME").unwrap_or_default();
        let mut cfg = Self::new(api_key, event_name);

        if let Ok(env) = std::env::var("TOLLGATE_ENVIRONMENT") {
            cfg.environment = env.parse()?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Fail fast on a missing or blank api key or event name
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(MeterError::Configuration(
                "apiKey must be a non-empty string".into(),
            ));
        }
        if self.event_name.trim().is_empty() {
            return Err(MeterError::Configuration(
                "eventName must be a non-empty string".into(),
            ));
        }
        Ok(())
    }
}

/// Batch scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Queue length that triggers an immediate flush
    pub max_size: usize,
    /// Debounce interval in milliseconds
    pub flush_interval_ms: u64,
    /// What happens to events whose delivery failed
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_BATCH_MAX_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl BatchConfig {
    pub fn new(max_size: usize, flush_interval_ms: u64) -> Self {
        Self {
            max_size,
            flush_interval_ms,
            ..Self::default()
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Replace zero values with the defaults
    pub(crate) fn normalized(mut self) -> Self {
        if self.max_size == 0 {
            self.max_size = DEFAULT_BATCH_MAX_SIZE;
        }
        if self.flush_interval_ms == 0 {
            self.flush_interval_ms = DEFAULT_FLUSH_INTERVAL_MS;
        }
        self
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}
