//! Config environment variable tests
//!
//! Config::from_env() also loads a .env file via dotenvy, so these tests set
//! every variable they assert on. Tests use #[serial] because env vars are
//! process-wide.

use idea_hardener::config::{Config, LogFormat};
use serial_test::serial;
use std::env;

fn with_api_key() {
    env::set_var("LANGBASE_API_KEY", "test-key");
}

#[test]
#[serial]
fn test_config_requires_api_key() {
    let saved = env::var("LANGBASE_API_KEY").ok();
    env::remove_var("LANGBASE_API_KEY");

    // A .env file in the working directory may still provide the key.
    if std::path::Path::new(".env").exists() {
        if let Some(key) = saved {
            env::set_var("LANGBASE_API_KEY", key);
        }
        return;
    }

    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("LANGBASE_API_KEY"));

    if let Some(key) = saved {
        env::set_var("LANGBASE_API_KEY", key);
    }
}

#[test]
#[serial]
fn test_config_custom_base_url() {
    with_api_key();
    env::set_var("LANGBASE_BASE_URL", "https://custom.api.com");

    let config = Config::from_env().unwrap();
    assert_eq!(config.langbase.api_key, "test-key");
    assert_eq!(config.langbase.base_url, "https://custom.api.com");

    env::remove_var("LANGBASE_BASE_URL");
}

#[test]
#[serial]
fn test_config_custom_database() {
    with_api_key();
    env::set_var("DATABASE_PATH", "/custom/path.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/path.db");
    assert_eq!(config.database.max_connections, 10);

    env::remove_var("DATABASE_PATH");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_config_json_log_format() {
    with_api_key();
    env::set_var("LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::set_var("LOG_FORMAT", "anything-else");
    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Pretty);

    env::remove_var("LOG_FORMAT");
}

#[test]
#[serial]
fn test_config_custom_request() {
    with_api_key();
    env::set_var("REQUEST_TIMEOUT_MS", "15000");
    env::set_var("MAX_RETRIES", "4");
    env::set_var("RETRY_DELAY_MS", "250");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, 15000);
    assert_eq!(config.request.max_retries, 4);
    assert_eq!(config.request.retry_delay_ms, 250);

    env::remove_var("REQUEST_TIMEOUT_MS");
    env::remove_var("MAX_RETRIES");
    env::remove_var("RETRY_DELAY_MS");
}

#[test]
#[serial]
fn test_config_unparseable_numbers_fall_back() {
    with_api_key();
    env::set_var("REQUEST_TIMEOUT_MS", "soon");
    env::set_var("MAX_RETRIES", "-1");
    env::set_var("DATABASE_MAX_CONNECTIONS", "many");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, 60000);
    assert_eq!(config.request.max_retries, 1);
    assert_eq!(config.database.max_connections, 5);

    env::remove_var("REQUEST_TIMEOUT_MS");
    env::remove_var("MAX_RETRIES");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_config_pipe_and_catalog_overrides() {
    with_api_key();
    env::set_var("PIPE_CRITIQUE", "my-critique");
    env::set_var("PIPE_CONTEXT_UPDATE", "my-fold");
    env::set_var("FRAMEWORKS_PATH", "/etc/hardener/frameworks.json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.pipes.critique, "my-critique");
    assert_eq!(config.pipes.context_update, "my-fold");
    assert_eq!(config.pipes.clarify, "hardener-clarify-v1");
    assert_eq!(
        config.frameworks.path.to_str().unwrap(),
        "/etc/hardener/frameworks.json"
    );

    env::remove_var("PIPE_CRITIQUE");
    env::remove_var("PIPE_CONTEXT_UPDATE");
    env::remove_var("FRAMEWORKS_PATH");
}
