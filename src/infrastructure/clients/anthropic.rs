//! Anthropic-compatible messages client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::http::{api_key_from_env, build_http_client, send_json};
use crate::domain::ports::{GenerateRequest, Generation, ModelClient, ModelError};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API requires `max_tokens`.
const DEFAULT_MAX_TOKENS: u32 = 1024;

const PROVIDER: &str = "Anthropic";

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: build_http_client(),
            api_key: api_key.into(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }

    pub fn from_env(env_var: &str) -> Result<Self, ModelError> {
        api_key_from_env(PROVIDER, env_var).map(Self::new)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn body(request: &GenerateRequest<'_>) -> Value {
        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": request.temperature,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        if let Some(map) = body.as_object_mut() {
            for (key, value) in request.params {
                map.insert(key.clone(), value.clone());
            }
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

impl MessagesResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn provider(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<Generation, ModelError> {
        let http_request = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&Self::body(request));
        let parsed: MessagesResponse = send_json(PROVIDER, http_request).await?;

        Ok(Generation {
            response: parsed.text(),
            input_tokens: parsed.usage.as_ref().and_then(|u| u.input_tokens),
            output_tokens: parsed.usage.as_ref().and_then(|u| u.output_tokens),
            finish_reason: parsed.stop_reason.unwrap_or_else(|| "unknown".into()),
        })
    }
}
