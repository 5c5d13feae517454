//! Model-calling clients
//!
//! Implementations of the [`ModelClient`] port: a deterministic mock plus
//! OpenAI-compatible and Anthropic-compatible HTTP clients. Callers pick
//! one with [`build_client`].

mod anthropic;
mod http;
mod mock;
mod openai;
mod retry;

use std::sync::Arc;

use crate::config::{ProviderKind, ProvidersConfig};
use crate::domain::ports::{ModelClient, ModelError};

pub use anthropic::{AnthropicClient, ANTHROPIC_API_KEY_ENV, ANTHROPIC_BASE_URL, ANTHROPIC_VERSION};
pub use mock::{MockCall, MockClient, DEFAULT_MOCK_RESPONSE};
pub use openai::{OpenAiClient, OPENAI_API_KEY_ENV, OPENAI_BASE_URL};
pub use retry::{run_with_retry, Retried, RetryConfig};

/// Build the client for `kind`.
///
/// An explicit `api_key` wins over the provider's configured environment
/// variable. The mock provider needs no key.
pub fn build_client(
    kind: ProviderKind,
    providers: &ProvidersConfig,
    api_key: Option<&str>,
) -> Result<Arc<dyn ModelClient>, ModelError> {
    let client: Arc<dyn ModelClient> = match kind {
        ProviderKind::Mock => Arc::new(MockClient::default()),
        ProviderKind::OpenAi => {
            let settings = &providers.openai;
            let client = match api_key {
                Some(key) => OpenAiClient::new(key),
                None => OpenAiClient::from_env(&settings.api_key_env)?,
            };
            Arc::new(client.with_base_url(&settings.base_url))
        }
        ProviderKind::Anthropic => {
            let settings = &providers.anthropic;
            let client = match api_key {
                Some(key) => AnthropicClient::new(key),
                None => AnthropicClient::from_env(&settings.api_key_env)?,
            };
            Arc::new(client.with_base_url(&settings.base_url))
        }
    };
    Ok(client)
}
