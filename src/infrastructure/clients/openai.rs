//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::http::{api_key_from_env, build_http_client, send_json};
use crate::domain::ports::{GenerateRequest, Generation, ModelClient, ModelError};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const PROVIDER: &str = "OpenAI";

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: build_http_client(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
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
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
        });
        if let Some(map) = body.as_object_mut() {
            if let Some(max_tokens) = request.max_tokens {
                map.insert("max_tokens".into(), json!(max_tokens));
            }
            for (key, value) in request.params {
                map.insert(key.clone(), value.clone());
            }
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<Generation, ModelError> {
        let http_request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&Self::body(request));
        let parsed: ChatResponse = send_json(PROVIDER, http_request).await?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response has no choices".into()))?;

        Ok(Generation {
            response: choice.message.content.unwrap_or_default(),
            input_tokens: parsed.usage.as_ref().and_then(|u| u.prompt_tokens),
            output_tokens: parsed.usage.as_ref().and_then(|u| u.completion_tokens),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".into()),
        })
    }
}
