//! Token usage accounting.
//!
//! Providers report usage in different shapes. [`extract_usage`] understands the
//! OpenAI `usage`/`token_usage` objects, the Gemini `usageMetadata`/`usage_metadata`
//! objects and flat `prompt_tokens`/`prompt_token_count` fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::AddAssign;

/// Token counts for one or more LLM calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub llm_calls: u64,
}

impl TokenUsage {
    /// Usage of a single call. `total` falls back to prompt + completion when zero.
    pub fn single(prompt: u64, completion: u64, total: u64) -> Self {
        Self {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: if total == 0 { prompt + completion } else { total },
            llm_calls: 1,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens += rhs.prompt_tokens;
        self.completion_tokens += rhs.completion_tokens;
        self.total_tokens += rhs.total_tokens;
        self.llm_calls += rhs.llm_calls;
    }
}

impl std::iter::Sum for TokenUsage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), |mut acc, u| {
            acc += u;
            acc
        })
    }
}

/// Cumulative usage owned by a single handle
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    total: TokenUsage,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one LLM call. Calls without reported usage still count.
    pub fn record(&mut self, usage: Option<TokenUsage>) {
        match usage {
            Some(usage) => self.total += TokenUsage { llm_calls: 1, ..usage },
            None => self.total.llm_calls += 1,
        }
    }

    pub fn usage(&self) -> TokenUsage {
        self.total
    }

    pub fn reset(&mut self) {
        self.total = TokenUsage::default();
    }
}

fn count(data: &Value, key: &str) -> u64 {
    data.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn has_any(data: &Value, keys: &[&str]) -> bool {
    keys.iter().any(|k| data.get(*k).is_some())
}

/// Extract usage from a provider response or metadata object.
pub fn extract_usage(data: &Value) -> Option<TokenUsage> {
    if !data.is_object() {
        return None;
    }

    for key in ["usage", "token_usage"] {
        if let Some(usage) = data.get(key).filter(|v| v.is_object()) {
            return Some(TokenUsage::single(
                count(usage, "prompt_tokens"),
                count(usage, "completion_tokens"),
                count(usage, "total_tokens"),
            ));
        }
    }

    if let Some(usage) = data.get("usageMetadata").filter(|v| v.is_object()) {
        return Some(TokenUsage::single(
            count(usage, "promptTokenCount"),
            count(usage, "candidatesTokenCount"),
            count(usage, "totalTokenCount"),
        ));
    }

    if let Some(usage) = data.get("usage_metadata").filter(|v| v.is_object()) {
        return Some(TokenUsage::single(
            count(usage, "prompt_token_count"),
            count(usage, "candidates_token_count"),
            count(usage, "total_token_count"),
        ));
    }

    if has_any(data, &["prompt_tokens", "completion_tokens"]) {
        return Some(TokenUsage::single(
            count(data, "prompt_tokens"),
            count(data, "completion_tokens"),
            count(data, "total_tokens"),
        ));
    }

    if has_any(data, &["prompt_token_count", "candidates_token_count"]) {
        return Some(TokenUsage::single(
            count(data, "prompt_token_count"),
            count(data, "candidates_token_count"),
            count(data, "total_token_count"),
        ));
    }

    None
}
