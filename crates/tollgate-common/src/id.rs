//! Event identifier generation
//!
//! Ids have the shape `{prefix}_{unix_millis}_{sequence}_{random}`. The
//! process-wide sequence keeps ids distinct within a single millisecond;
//! the base-36 suffix keeps them distinct across processes.

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared across every generator in the process
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

const SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates unique event ids with a fixed prefix
#[derive(Debug, Clone)]
pub struct EventIdGenerator {
    prefix: String,
}

impl EventIdGenerator {
    /// Create a generator for the given prefix (e.g. an event name or `llm`)
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Prefix applied to every id
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate the next id
    pub fn next_id(&self) -> String {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}_{}_{}", self.prefix, timestamp, sequence, random_suffix())
    }
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}
