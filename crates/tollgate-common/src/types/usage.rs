//! UsageRecord - canonical token counts for a single call

use crate::types::event::Metadata;
use serde::{Deserialize, Serialize};

/// Normalized token usage across providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub model: String,
}

impl UsageRecord {
    /// Create a record whose total is the sum of input and output
    pub fn new(input_tokens: u64, output_tokens: u64, model: impl Into<String>) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
            model: model.into(),
        }
    }

    /// Override the total with an explicitly reported value
    pub fn with_total(mut self, total_tokens: u64) -> Self {
        self.total_tokens = total_tokens;
        self
    }

    /// Render as event metadata (`inputTokens`, `outputTokens`, `totalTokens`, `model`)
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("inputTokens".into(), self.input_tokens.into());
        metadata.insert("outputTokens".into(), self.output_tokens.into());
        metadata.insert("totalTokens".into(), self.total_tokens.into());
        metadata.insert("model".into(), self.model.clone().into());
        metadata
    }
}
