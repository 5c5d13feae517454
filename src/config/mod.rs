//! Configuration module for PAL
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (PAL_*)
//! 3. Project config (./pal.toml)
//! 4. User config (<config_dir>/pal/config.toml)
//! 5. Built-in defaults (lowest priority)

mod loader;
#[cfg(test)]
mod tests;
mod types;

pub use loader::{ConfigWarning, PROJECT_CONFIG_FILE};
pub use types::{
    Config, ExecutionConfig, ProviderConfig, ProviderKind, ProvidersConfig, RetrySettings,
};
