//! Configuration resolution and graceful degradation
//!
//! Tests that touch VIGIL_* environment variables are marked #[serial] so
//! they never race each other.

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use vigil_common::config::{
    CompiledDefaults, ConfigResolver, DataFolderInitializer, LoggingConfig, TomlConfig,
    ENV_API_TOKEN, ENV_BIND_ADDR, ENV_DATA_FOLDER, ENV_SERVER_URL,
};

fn clear_env() {
    env::remove_var(ENV_SERVER_URL);
    env::remove_var(ENV_BIND_ADDR);
    env::remove_var(ENV_DATA_FOLDER);
    env::remove_var(ENV_API_TOKEN);
}

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();

    assert_eq!(defaults.server_url, "http://127.0.0.1:5780");
    assert_eq!(defaults.bind_addr, "127.0.0.1:5780");
    assert_eq!(defaults.reconnect_delay_ms, 2000);
    assert_eq!(defaults.log_level, "info");
    assert!(!defaults.data_folder.as_os_str().is_empty());
}

#[test]
#[serial]
fn test_no_overrides_uses_defaults() {
    clear_env();
    let resolver = ConfigResolver::with_toml(TomlConfig::default());
    let defaults = CompiledDefaults::for_current_platform();

    assert_eq!(resolver.server_url(None), defaults.server_url);
    assert_eq!(resolver.bind_addr(None), defaults.bind_addr);
    assert_eq!(resolver.data_folder(None), defaults.data_folder);
    assert_eq!(resolver.api_token(None), None);
    assert_eq!(resolver.reconnect_delay_ms(None), 2000);
    assert_eq!(resolver.log_level(), defaults.log_level);
}

#[test]
#[serial]
fn test_priority_order() {
    clear_env();
    let toml = TomlConfig {
        server_url: Some("http://from-toml:1".to_string()),
        ..Default::default()
    };
    let resolver = ConfigResolver::with_toml(toml);

    // TOML beats default
    assert_eq!(resolver.server_url(None), "http://from-toml:1");

    // Environment beats TOML
    env::set_var(ENV_SERVER_URL, "http://from-env:2");
    assert_eq!(resolver.server_url(None), "http://from-env:2");

    // CLI beats everything
    assert_eq!(resolver.server_url(Some("http://from-cli:3")), "http://from-cli:3");

    clear_env();
}

#[test]
#[serial]
fn test_empty_token_means_no_token() {
    clear_env();
    env::set_var(ENV_API_TOKEN, "");
    let resolver = ConfigResolver::with_toml(TomlConfig::default());
    assert_eq!(resolver.api_token(None), None);

    env::set_var(ENV_API_TOKEN, "s3cret");
    assert_eq!(resolver.api_token(None), Some("s3cret".to_string()));
    clear_env();
}

#[test]
#[serial]
fn test_data_folder_env_override() {
    clear_env();
    env::set_var(ENV_DATA_FOLDER, "/tmp/vigil-env-folder");
    let resolver = ConfigResolver::with_toml(TomlConfig::default());
    assert_eq!(resolver.data_folder(None), PathBuf::from("/tmp/vigil-env-folder"));
    clear_env();
}

#[test]
fn test_toml_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            server_url = "http://hub.example:8080"
            reconnect_delay_ms = 500
            [logging]
            level = "debug"
        "#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.server_url.as_deref(), Some("http://hub.example:8080"));
    assert_eq!(config.reconnect_delay_ms, Some(500));
    assert_eq!(config.logging.level.as_deref(), Some("debug"));
    assert_eq!(config.api_token, None);

    let resolver = ConfigResolver::with_toml(config);
    assert_eq!(resolver.reconnect_delay_ms(None), 500);
    assert_eq!(resolver.reconnect_delay_ms(Some(100)), 100);
    assert_eq!(resolver.log_level(), "debug");
}

#[test]
fn test_toml_load_rejects_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "server_url = [not toml").unwrap();

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_missing_logging_section_defaults() {
    let config: TomlConfig = toml::from_str(r#"bind_addr = "0.0.0.0:9000""#).unwrap();
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.bind_addr.as_deref(), Some("0.0.0.0:9000"));
}

#[test]
fn test_initializer_creates_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("level1").join("level2");

    let initializer = DataFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();
    // Idempotent
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("vigil.db"));
}
