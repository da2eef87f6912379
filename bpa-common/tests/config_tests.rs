//! Bootstrap configuration loading tests

use bpa_common::config::{load_or_default, load_toml_config, ConfigFileResolver, CONFIG_ENV_VAR};
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_full_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        port = 6000
        estimator = "model"

        [completion]
        model = "gpt-4o-mini"
        timeout_secs = 50
        api_key = "sk-from-toml"

        [retry]
        max_attempts = 5

        [competitors]
        max_competitors = 4
        "#
    )
    .unwrap();

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.port, 6000);
    assert_eq!(config.estimator, "model");
    assert_eq!(config.completion.model, "gpt-4o-mini");
    assert_eq!(config.completion.timeout_secs, 50);
    assert_eq!(config.completion.api_key.as_deref(), Some("sk-from-toml"));
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.competitors.max_competitors, 4);
    assert_eq!(config.extraction.navigation_timeout_secs, 30);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_or_default(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.port, 5730);
    assert!(config.completion.api_key.is_none());
}

#[test]
fn test_unparseable_file_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "port = \"not a number").unwrap();
    assert!(load_or_default(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_cli_path_wins_over_env() {
    std::env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolver = ConfigFileResolver::new("bpa-ai");
    let cli = PathBuf::from("/tmp/from-cli.toml");
    assert_eq!(resolver.resolve(Some(&cli)), Some(cli));
    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    std::env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolver = ConfigFileResolver::new("bpa-ai");
    assert_eq!(resolver.resolve(None), Some(PathBuf::from("/tmp/from-env.toml")));
    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_default_path_used_without_cli_or_env() {
    std::env::remove_var(CONFIG_ENV_VAR);
    let resolver = ConfigFileResolver::new("bpa-ai");
    assert_eq!(resolver.resolve(None), resolver.default_path());
    if let Some(path) = resolver.default_path() {
        assert!(path.ends_with("bpa/bpa-ai.toml"));
    }
}
