use std::path::PathBuf;
use std::time::Duration;

use tempfile::tempdir;

use super::loader::apply_overrides_from;
use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.execution.provider, ProviderKind::Mock);
    assert_eq!(config.execution.temperature, 0.7);
    assert_eq!(config.retry.max_retries, 0);
    assert_eq!(config.providers.openai.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.providers.anthropic.api_key_env, "ANTHROPIC_API_KEY");
}

#[test]
fn test_config_load_full_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pal.toml");
    std::fs::write(
        &path,
        r#"
[execution]
provider = "anthropic"
model = "claude-3-haiku-20240307"
temperature = 0.2
max_tokens = 256

[retry]
max_retries = 3
initial_delay_ms = 100

[providers.openai]
base_url = "http://localhost:8080/v1"

[pricing."local-llama"]
input_per_1k = 0.0001
output_per_1k = 0.0002
"#,
    )
    .unwrap();

    let (config, warnings) = Config::load_with_warnings(&path).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(config.execution.provider, ProviderKind::Anthropic);
    assert_eq!(config.execution.max_tokens, Some(256));
    assert_eq!(config.providers.openai.base_url, "http://localhost:8080/v1");
    // Unset keys of a partially specified provider keep their defaults.
    assert_eq!(config.providers.openai.api_key_env, "OPENAI_API_KEY");

    let retry = config.retry_config();
    assert_eq!(retry.max_retries, 3);
    assert_eq!(retry.initial_delay, Duration::from_millis(100));
    assert_eq!(retry.max_delay, Duration::from_millis(8_000));

    let pricing = config.pricing_table();
    assert!(pricing.lookup("local-llama").is_some());
    assert!(pricing.lookup("gpt-4o").is_some());
}

#[test]
fn test_unknown_keys_are_warnings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pal.toml");
    std::fs::write(&path, "[execution]\nprovder = \"openai\"\n").unwrap();

    let (config, warnings) = Config::load_with_warnings(&path).unwrap();
    assert_eq!(config.execution.provider, ProviderKind::Mock);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].key, "provder");
    assert_eq!(warnings[0].line, Some(2));
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pal.toml");
    std::fs::write(&path, "[execution\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, crate::error::PalError::Config { .. }));
}

#[test]
fn test_unknown_provider_value_is_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pal.toml");
    std::fs::write(&path, "[execution]\nprovider = \"gemini\"\n").unwrap();

    assert!(Config::load(&path).is_err());
}

#[test]
fn test_retry_multiplier_below_one_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pal.toml");
    std::fs::write(&path, "[retry]\nmax_retries = 2\nmultiplier = -2.0\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, crate::error::PalError::Config { .. }));
    assert!(err.to_string().contains("retry.multiplier"));

    std::fs::write(&path, "[retry]\nmultiplier = nan\n").unwrap();
    assert!(Config::load(&path).is_err());

    std::fs::write(&path, "[retry]\nmultiplier = 1.0\n").unwrap();
    assert_eq!(Config::load(&path).unwrap().retry.multiplier, 1.0);
}

#[test]
fn test_project_config_is_preferred() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join(PROJECT_CONFIG_FILE),
        "[execution]\nmodel = \"gpt-4o\"\n",
    )
    .unwrap();

    let config = Config::load_or_default(Some(dir.path()));
    // PAL_MODEL may be set in the environment running the tests.
    if std::env::var("PAL_MODEL").is_err() {
        assert_eq!(config.execution.model.as_deref(), Some("gpt-4o"));
    }
}

#[test]
fn test_env_overrides() {
    let config = apply_overrides_from(
        Config::default(),
        &[
            ("PAL_PROVIDER", "OpenAI"),
            ("PAL_MODEL", "gpt-4o-mini"),
            ("PAL_LOG_FILE", "/tmp/pal.jsonl"),
        ],
    );
    assert_eq!(config.execution.provider, ProviderKind::OpenAi);
    assert_eq!(config.execution.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(
        config.execution.log_file,
        Some(PathBuf::from("/tmp/pal.jsonl"))
    );
}

#[test]
fn test_invalid_env_provider_keeps_config_value() {
    let mut base = Config::default();
    base.execution.provider = ProviderKind::Anthropic;
    let config = apply_overrides_from(base, &[("PAL_PROVIDER", "nope")]);
    assert_eq!(config.execution.provider, ProviderKind::Anthropic);
}

#[test]
fn test_provider_kind_parse_and_display() {
    assert_eq!("openai".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
    assert_eq!(ProviderKind::Anthropic.to_string(), "anthropic");
    assert!("bogus".parse::<ProviderKind>().is_err());
}
