//! Configuration type definitions

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::services::{ModelPricing, PricingTable};
use crate::error::PalResult;
use crate::infrastructure::clients::{
    RetryConfig, ANTHROPIC_API_KEY_ENV, ANTHROPIC_BASE_URL, OPENAI_API_KEY_ENV, OPENAI_BASE_URL,
};

use super::loader::{self, ConfigWarning};

/// Model provider selected for execution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Mock,
    #[value(name = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Mock => "mock",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(format!(
                "unknown provider '{other}' (expected mock, openai or anthropic)"
            )),
        }
    }
}

/// `[execution]` defaults for `pal execute` and `pal evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            temperature: default_temperature(),
            max_tokens: None,
            log_file: None,
        }
    }
}

fn default_temperature() -> f64 {
    0.7
}

/// `[retry]` section, in milliseconds so it reads naturally in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetrySettings {
    /// Reject settings that would make the backoff shrink or go negative.
    pub fn validate(&self) -> Result<(), String> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(format!(
                "retry.multiplier must be a finite number >= 1.0, got {}",
                self.multiplier
            ));
        }
        Ok(())
    }
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        RetryConfig {
            max_retries: settings.max_retries,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            multiplier: settings.multiplier,
            ..RetryConfig::default()
        }
    }
}

/// Connection settings for one HTTP provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key_env: String,
}

impl ProviderConfig {
    pub fn openai() -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            api_key_env: OPENAI_API_KEY_ENV.to_string(),
        }
    }

    pub fn anthropic() -> Self {
        Self {
            base_url: ANTHROPIC_BASE_URL.to_string(),
            api_key_env: ANTHROPIC_API_KEY_ENV.to_string(),
        }
    }
}

/// `[providers.*]` tables. Missing keys fall back per provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "ProviderConfig::openai", deserialize_with = "openai_table")]
    pub openai: ProviderConfig,

    #[serde(
        default = "ProviderConfig::anthropic",
        deserialize_with = "anthropic_table"
    )]
    pub anthropic: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::openai(),
            anthropic: ProviderConfig::anthropic(),
        }
    }
}

#[derive(Deserialize)]
struct PartialProvider {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key_env: Option<String>,
}

impl PartialProvider {
    fn over(self, defaults: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            api_key_env: self.api_key_env.unwrap_or(defaults.api_key_env),
        }
    }
}

fn openai_table<'de, D>(deserializer: D) -> Result<ProviderConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(PartialProvider::deserialize(deserializer)?.over(ProviderConfig::openai()))
}

fn anthropic_table<'de, D>(deserializer: D) -> Result<ProviderConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(PartialProvider::deserialize(deserializer)?.over(ProviderConfig::anthropic()))
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Extra or overriding per-model prices.
    #[serde(default)]
    pub pricing: IndexMap<String, ModelPricing>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> PalResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> PalResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load from project config, user config, or defaults
    pub fn load_or_default(project_root: Option<&Path>) -> Self {
        loader::load_or_default(project_root)
    }

    /// Apply environment variable overrides (PAL_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::from(&self.retry)
    }

    /// Built-in prices extended by the `[pricing]` table.
    pub fn pricing_table(&self) -> PricingTable {
        let mut table = PricingTable::default();
        for (model, pricing) in &self.pricing {
            table.insert(model.clone(), *pricing);
        }
        table
    }
}
