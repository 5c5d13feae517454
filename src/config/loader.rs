//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PalError, PalResult};

use super::types::{Config, ProviderKind};

/// File name of the project-level configuration.
pub const PROJECT_CONFIG_FILE: &str = "pal.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> PalResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| PalError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| PalError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    config.retry.validate().map_err(|message| PalError::Config {
        path: path.to_path_buf(),
        message,
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(&content, &key),
                key,
                file: path.to_path_buf(),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load from project config, user config, or defaults
pub fn load_or_default(project_root: Option<&Path>) -> Config {
    let candidates = project_root
        .map(|root| root.join(PROJECT_CONFIG_FILE))
        .into_iter()
        .chain(dirs::config_dir().map(|dir| dir.join("pal").join("config.toml")));

    for candidate in candidates {
        if !candidate.exists() {
            continue;
        }
        match load_with_warnings(&candidate) {
            Ok((config, warnings)) => {
                for warning in &warnings {
                    warn!("{warning}");
                }
                debug!(path = %candidate.display(), "Loaded configuration");
                return with_env_overrides(config);
            }
            Err(e) => warn!("ignoring configuration: {e}"),
        }
    }

    with_env_overrides(Config::default())
}

/// Apply environment variable overrides (PAL_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(provider) = var("PAL_PROVIDER") {
        match provider.parse::<ProviderKind>() {
            Ok(kind) => config.execution.provider = kind,
            Err(e) => warn!("PAL_PROVIDER: {e}"),
        }
    }

    if let Some(model) = var("PAL_MODEL").filter(|m| !m.trim().is_empty()) {
        config.execution.model = Some(model);
    }

    if let Some(log_file) = var("PAL_LOG_FILE").filter(|p| !p.trim().is_empty()) {
        config.execution.log_file = Some(PathBuf::from(log_file));
    }

    config
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.trim_start().starts_with(needle))
        .map(|i| i + 1)
}

#[cfg(test)]
pub(super) fn apply_overrides_from(
    config: Config,
    vars: &[(&str, &str)],
) -> Config {
    apply_overrides(config, |key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
}
