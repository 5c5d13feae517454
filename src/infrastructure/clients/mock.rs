//! Mock model client
//!
//! Deterministic provider for tests, demos and the `mock` CLI provider.
//! Token counts are whitespace-separated word counts.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::ports::{GenerateRequest, Generation, ModelClient, ModelError};

pub const DEFAULT_MOCK_RESPONSE: &str = "This is a mock response from the PAL system.";

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub prompt: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub params: Map<String, Value>,
}

#[derive(Debug)]
pub struct MockClient {
    response: String,
    queued_failures: Mutex<VecDeque<ModelError>>,
    always_fail: Option<ModelError>,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_RESPONSE)
    }
}

impl MockClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            queued_failures: Mutex::new(VecDeque::new()),
            always_fail: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with `error`.
    pub fn failing(error: ModelError) -> Self {
        Self {
            always_fail: Some(error),
            ..Self::default()
        }
    }

    /// Fail the next call with `error` before responding normally.
    pub fn with_failure(self, error: ModelError) -> Self {
        self.queued_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn last_call(&self) -> Option<MockCall> {
        self.calls().last().cloned()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_call().map(|c| c.prompt)
    }

    pub fn last_model(&self) -> Option<String> {
        self.last_call().map(|c| c.model)
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[async_trait]
impl ModelClient for MockClient {
    fn provider(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<Generation, ModelError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockCall {
                prompt: request.prompt.to_string(),
                model: request.model.to_string(),
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                params: request.params.clone(),
            });

        let queued = self
            .queued_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(err) = queued.or_else(|| self.always_fail.clone()) {
            return Err(err);
        }

        Ok(Generation {
            response: self.response.clone(),
            input_tokens: Some(word_count(request.prompt)),
            output_tokens: Some(word_count(&self.response)),
            finish_reason: "stop".to_string(),
        })
    }
}
