//! Execution result entity
//!
//! One record per executor call, successful or not. Records are never
//! mutated once created; the executor hands out clones.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub prompt_id: String,
    pub prompt_version: String,
    pub model: String,
    pub compiled_prompt: String,
    pub response: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
    pub execution_time_ms: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
}

impl ExecutionResult {
    pub fn total_tokens(&self) -> Option<u32> {
        Some(self.input_tokens? + self.output_tokens?)
    }
}
