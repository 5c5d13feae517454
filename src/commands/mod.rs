//! Command implementations
//!
//! Each `cmd_*` function owns one subcommand: it reads its inputs, runs the
//! matching application use case and prints the outcome.

mod compile;
pub mod evaluate;
pub mod execute;
mod info;
mod validate;

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pal::application::{ExecuteOptions, PromptExecutor};
use pal::config::Config;
use pal::infrastructure::build_client;
use serde_json::{Map, Value};

use crate::cli::{ModelArgs, VarsArgs};

pub use compile::cmd_compile;
pub use evaluate::cmd_evaluate;
pub use execute::cmd_execute;
pub use info::cmd_info;
pub use validate::cmd_validate;

/// Merge `--vars-file` and then `--vars` (the inline object wins).
pub fn load_variables(args: &VarsArgs) -> Result<Map<String, Value>> {
    let mut variables = Map::new();

    if let Some(path) = &args.vars_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read variables file {}", path.display()))?;
        // YAML is a superset of JSON, so either format parses here.
        let value: Value = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("invalid variables file {}", path.display()))?;
        variables.extend(into_object(value, "--vars-file")?);
    }

    if let Some(raw) = &args.vars {
        let value: Value = serde_json::from_str(raw).context("invalid JSON in --vars")?;
        variables.extend(into_object(value, "--vars")?);
    }

    Ok(variables)
}

fn into_object(value: Value, source: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => bail!("{source} must be a JSON object, got {other}"),
    }
}

/// Write `content` to `path` atomically (temp file in the same directory,
/// then rename).
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Flags first, then configuration, then built-in defaults.
pub fn execute_options(
    config: &Config,
    args: &ModelArgs,
    fallback_model: Option<&str>,
) -> Result<ExecuteOptions> {
    let model = args
        .model
        .clone()
        .or_else(|| config.execution.model.clone())
        .or_else(|| fallback_model.map(str::to_string));
    let Some(model) = model else {
        bail!("no model given: pass --model or set execution.model in pal.toml");
    };

    Ok(ExecuteOptions::new(model)
        .with_temperature(args.temperature.unwrap_or(config.execution.temperature))
        .with_max_tokens(args.max_tokens.or(config.execution.max_tokens)))
}

pub fn build_executor(
    config: &Config,
    args: &ModelArgs,
    log_file: Option<&Path>,
) -> Result<PromptExecutor> {
    let provider = args.provider.unwrap_or(config.execution.provider);
    let client = build_client(provider, &config.providers, args.api_key.as_deref())?;

    let mut executor = PromptExecutor::new(client)
        .with_retry(config.retry_config())
        .with_pricing(config.pricing_table());

    if let Some(path) = log_file.or(config.execution.log_file.as_deref()) {
        executor = executor.with_log_file(path);
    }
    Ok(executor)
}
