//! ModelClient port
//!
//! The single capability the executor needs from a model provider: turn a
//! prompt into a response. Provider implementations (mock, OpenAI-compatible,
//! Anthropic-compatible) live in the infrastructure layer.

use async_trait::async_trait;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    /// Provider-specific parameters passed through untouched.
    pub params: &'a Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub response: String,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub finish_reason: String,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{provider} API HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("request failed: {0}")]
    Network(String),

    #[error("{provider} API key not set (expected in ${env_var})")]
    MissingApiKey { provider: String, env_var: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Whether retrying the same request may succeed.
    ///
    /// Rate limits, server errors and network failures are transient;
    /// client errors and configuration problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Http { status, .. } => matches!(status, 408 | 429 | 500..=599),
            ModelError::Network(_) => true,
            ModelError::MissingApiKey { .. }
            | ModelError::InvalidResponse(_)
            | ModelError::Other(_) => false,
        }
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Short provider label recorded in execution metadata.
    fn provider(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<Generation, ModelError>;
}
