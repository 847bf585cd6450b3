//! Usage normalization
//!
//! Extracts a canonical [`UsageRecord`] from heterogeneous provider
//! responses. Schemas are tried in a fixed priority order and the first
//! match wins; no merging across schemas happens.
//!
//! Numeric fields follow "present and positive, otherwise default"
//! semantics: zero, negative, null and non-numeric values all count as
//! absent. A reported total of zero therefore falls back to the sum.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tollgate_common::{UsageRecord, UNKNOWN_MODEL};

/// Usage layout recognized in a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageSchema {
    /// `usageMetadata.{promptTokenCount, candidatesTokenCount, totalTokenCount}`
    UsageMetadata,
    /// `usage.{prompt_tokens, completion_tokens, total_tokens}`
    PromptCompletion,
    /// `usage.{input_tokens, output_tokens}`, total is always the sum
    InputOutput,
    /// `usage.{inputTokens, outputTokens, totalTokens}`
    CamelCase,
    /// Any other `usage` object, read leniently
    Generic,
}

/// Identify which usage layout a response carries, if any
pub fn detect_schema(response: &Value) -> Option<UsageSchema> {
    if response.get("usageMetadata").is_some_and(is_truthy) {
        return Some(UsageSchema::UsageMetadata);
    }

    let usage = response.get("usage").filter(|u| is_truthy(u))?;

    let schema = if usage.get("prompt_tokens").is_some() {
        UsageSchema::PromptCompletion
    } else if usage.get("input_tokens").is_some() {
        UsageSchema::InputOutput
    } else if usage.get("inputTokens").is_some() {
        UsageSchema::CamelCase
    } else {
        UsageSchema::Generic
    };
    Some(schema)
}

/// Extract token usage from a response; `None` means "do not emit"
pub fn extract_usage(response: &Value) -> Option<UsageRecord> {
    let schema = detect_schema(response)?;

    if schema == UsageSchema::UsageMetadata {
        let meta = &response["usageMetadata"];
        let input = count(meta, "promptTokenCount");
        let output = count(meta, "candidatesTokenCount");
        return Some(record(
            input,
            output,
            positive(meta.get("totalTokenCount")),
            model(response, "modelVersion"),
        ));
    }

    let usage = &response["usage"];
    let (input, output, total) = match schema {
        UsageSchema::PromptCompletion => (
            count(usage, "prompt_tokens"),
            count(usage, "completion_tokens"),
            positive(usage.get("total_tokens")),
        ),
        UsageSchema::InputOutput => (count(usage, "input_tokens"), count(usage, "output_tokens"), None),
        UsageSchema::CamelCase => (
            count(usage, "inputTokens"),
            count(usage, "outputTokens"),
            positive(usage.get("totalTokens")),
        ),
        UsageSchema::Generic | UsageSchema::UsageMetadata => (
            first_positive(usage, &["inputTokens", "input"]),
            first_positive(usage, &["outputTokens", "output"]),
            positive(usage.get("totalTokens")).or_else(|| positive(usage.get("total"))),
        ),
    };

    Some(record(input, output, total, model(response, "model")))
}

fn record(input: u64, output: u64, total: Option<u64>, model: String) -> UsageRecord {
    let usage = UsageRecord::new(input, output, model);
    match total {
        Some(total) => usage.with_total(total),
        None => usage,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Positive numeric value, truncated to an integer
fn positive(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    if let Some(n) = value.as_u64() {
        return (n > 0).then_some(n);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= 1.0)
        .map(|f| f as u64)
}

fn count(container: &Value, key: &str) -> u64 {
    positive(container.get(key)).unwrap_or(0)
}

fn first_positive(container: &Value, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|key| positive(container.get(*key)))
        .unwrap_or(0)
}

fn model(response: &Value, key: &str) -> String {
    response
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_MODEL)
        .to_string()
}
