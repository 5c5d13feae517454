//! Prompt execution
//!
//! [`PromptExecutor`] sends compiled prompt text to a [`ModelClient`],
//! prices the call, writes best-effort audit records and keeps an in-process
//! history of every result.
//!
//! ## Flow (per call)
//!
//! 1. Audit `prompt_execution_start`
//! 2. Call the model client, retrying transient failures
//! 3. Audit `prompt_execution_complete` or `prompt_execution_error`
//! 4. Append the result to history (on success and on failure)

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::domain::entities::{ExecutionResult, PromptAssembly};
use crate::domain::ports::{AuditSink, GenerateRequest, ModelClient};
use crate::domain::services::PricingTable;
use crate::domain::value_objects::ContentHash;
use crate::error::{PalError, PalResult};
use crate::infrastructure::audit::JsonlAuditLog;
use crate::infrastructure::clients::{run_with_retry, RetryConfig};

pub const EVENT_START: &str = "prompt_execution_start";
pub const EVENT_COMPLETE: &str = "prompt_execution_complete";
pub const EVENT_ERROR: &str = "prompt_execution_error";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Model and sampling parameters for one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteOptions {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    /// Provider-specific parameters passed through to the client.
    pub params: Map<String, Value>,
}

impl ExecuteOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            params: Map::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

pub struct PromptExecutor {
    client: Arc<dyn ModelClient>,
    audit: Option<Arc<dyn AuditSink>>,
    retry: RetryConfig,
    pricing: PricingTable,
    history: Mutex<Vec<ExecutionResult>>,
}

impl PromptExecutor {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            audit: None,
            retry: RetryConfig::default(),
            pricing: PricingTable::default(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Audit to a JSON-lines file.
    pub fn with_log_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_audit_sink(Arc::new(JsonlAuditLog::new(path)))
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    /// Execute `compiled_prompt` on behalf of `assembly`.
    ///
    /// Exactly one result is appended to history per call. A client failure
    /// is recorded as a failed result and then returned as
    /// [`PalError::Execute`].
    pub async fn execute(
        &self,
        compiled_prompt: &str,
        assembly: &PromptAssembly,
        options: &ExecuteOptions,
    ) -> PalResult<ExecutionResult> {
        let prompt_hash = ContentHash::from_content(compiled_prompt);
        let timestamp = Utc::now();
        let started = Instant::now();

        self.audit(json!({
            "event": EVENT_START,
            "phase": "start",
            "timestamp": timestamp.to_rfc3339(),
            "prompt_id": assembly.id,
            "prompt_version": assembly.version,
            "model": options.model,
            "provider": self.client.provider(),
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
            "prompt_hash": prompt_hash.as_str(),
        }))
        .await;

        let request = GenerateRequest {
            prompt: compiled_prompt,
            model: &options.model,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            params: &options.params,
        };
        debug!(prompt = %assembly.id, model = %options.model, "Calling model");
        let retried = run_with_retry(&self.retry, || self.client.generate(&request)).await;
        let execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut metadata = IndexMap::new();
        metadata.insert("provider".to_string(), json!(self.client.provider()));
        metadata.insert("prompt_hash".to_string(), json!(prompt_hash.as_str()));
        metadata.insert("attempts".to_string(), json!(retried.attempts));

        let mut result = ExecutionResult {
            prompt_id: assembly.id.clone(),
            prompt_version: assembly.version.clone(),
            model: options.model.clone(),
            compiled_prompt: compiled_prompt.to_string(),
            response: String::new(),
            success: false,
            error: None,
            input_tokens: None,
            output_tokens: None,
            cost_usd: None,
            execution_time_ms,
            timestamp,
            metadata,
        };

        match retried.result {
            Ok(generation) => {
                result.success = true;
                result.response = generation.response;
                result.input_tokens = generation.input_tokens;
                result.output_tokens = generation.output_tokens;
                result.cost_usd = self.estimate_cost(
                    &options.model,
                    generation.input_tokens,
                    generation.output_tokens,
                );
                result
                    .metadata
                    .insert("finish_reason".to_string(), json!(generation.finish_reason));

                self.audit(json!({
                    "event": EVENT_COMPLETE,
                    "phase": "complete",
                    "timestamp": Utc::now().to_rfc3339(),
                    "prompt_id": result.prompt_id,
                    "prompt_version": result.prompt_version,
                    "model": result.model,
                    "success": true,
                    "input_tokens": result.input_tokens,
                    "output_tokens": result.output_tokens,
                    "cost_usd": result.cost_usd,
                    "execution_time_ms": result.execution_time_ms,
                    "attempts": retried.attempts,
                }))
                .await;

                info!(
                    prompt = %result.prompt_id,
                    model = %result.model,
                    elapsed_ms = result.execution_time_ms as u64,
                    "Execution succeeded"
                );
                self.record(result.clone());
                Ok(result)
            }
            Err(err) => {
                let message = err.to_string();
                result.error = Some(message.clone());

                self.audit(json!({
                    "event": EVENT_ERROR,
                    "phase": "error",
                    "timestamp": Utc::now().to_rfc3339(),
                    "prompt_id": result.prompt_id,
                    "prompt_version": result.prompt_version,
                    "model": result.model,
                    "success": false,
                    "error": message,
                    "execution_time_ms": result.execution_time_ms,
                    "attempts": retried.attempts,
                }))
                .await;

                warn!(prompt = %result.prompt_id, error = %message, "Execution failed");
                self.record(result);
                Err(PalError::Execute {
                    prompt_id: assembly.id.clone(),
                    model: options.model.clone(),
                    message,
                })
            }
        }
    }

    /// Estimated USD cost; `None` when tokens are missing or the model is
    /// not priced.
    pub fn estimate_cost(
        &self,
        model: &str,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
    ) -> Option<f64> {
        self.pricing
            .estimate_cost(model, input_tokens, output_tokens)
    }

    /// Snapshot of every result recorded so far, oldest first.
    pub fn get_execution_history(&self) -> Vec<ExecutionResult> {
        self.lock_history().clone()
    }

    pub fn clear_history(&self) {
        self.lock_history().clear();
    }

    fn record(&self, result: ExecutionResult) {
        self.lock_history().push(result);
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, Vec<ExecutionResult>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best effort; failures are logged and dropped.
    async fn audit(&self, record: Value) {
        let Some(sink) = &self.audit else {
            return;
        };
        if let Err(e) = sink.append(&record).await {
            warn!(error = %e, "Failed to write audit record");
        }
    }
}
