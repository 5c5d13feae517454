//! Shared HTTP plumbing for the provider clients.

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::ports::ModelError;

pub(super) fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("pal/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_default()
}

/// Send `request` and decode a successful JSON body.
pub(super) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, ModelError> {
    let start = Instant::now();
    let response = request
        .send()
        .await
        .map_err(|e| ModelError::Network(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ModelError::Network(format!("failed to read response: {e}")))?;

    debug!(
        provider,
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        bytes = text.len(),
        "Model response"
    );

    if !status.is_success() {
        return Err(ModelError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text)
        .map_err(|e| ModelError::InvalidResponse(format!("failed to parse response: {e}")))
}

/// Read an API key from the environment.
pub(super) fn api_key_from_env(provider: &str, env_var: &str) -> Result<String, ModelError> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ModelError::MissingApiKey {
            provider: provider.to_string(),
            env_var: env_var.to_string(),
        }),
    }
}
