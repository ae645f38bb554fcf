//! Integration tests for `logscope config` loading.
//!
//! Tests config validation and environment overrides with real TOML files.

use std::fs;
use tempfile::TempDir;

use logscope_core::config::{FailurePolicy, LogscopeConfig};
use logscope_core::error::{ConfigError, LogscopeError};

const VALID_CONFIG: &str = r#"
[general]
log_level = "info"
log_format = "json"

[search]
parallel = true
utilization = 0.5
failure_policy = "partial"

[log_files]
path_template = "/apps/logs/$cluster/$server/"

[[environments]]
name = "itg"
machines = ["itg-host-01", "itg-host-02"]

[[machines]]
name = "itg-host-01"
[[machines.clusters]]
name = "order_cluster"
servers = ["order_s1", "order_s2"]

[[machines]]
name = "itg-host-02"
[[machines.clusters]]
name = "order_cluster"
servers = ["order_s3"]

[[log_types]]
name = "access_log"
file_name = "$server_access.log"
headers = ["Time", "Level", "Message"]
tag = "|"

[[log_types]]
name = "managed_server_log"
file_name = "$server.out"
headers = ["Time", "Severity", "Subsystem", "Message"]
tag = { kind = "delimited", start = "<", end = ">" }
"#;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("should write config");
    path
}

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "logscope.toml", VALID_CONFIG);

    // When: Loading the config
    let config = LogscopeConfig::from_file(&config_path)
        .await
        .expect("valid config should load successfully");

    // Then: Topology and log types are kept in configured order
    assert_eq!(config.environments[0].machines, vec!["itg-host-01", "itg-host-02"]);
    assert_eq!(config.log_types.len(), 2);
    assert_eq!(config.search.failure_policy, FailurePolicy::Partial);
    assert!((config.search.utilization - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "bad.toml", "[general\nlog_level = \"info\"\n");

    let err = LogscopeConfig::from_file(&config_path)
        .await
        .expect_err("malformed TOML should fail to load");
    assert!(matches!(
        err,
        LogscopeError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
async fn test_config_validate_missing_file() {
    let config_path = std::path::PathBuf::from("/nonexistent/logscope.toml");

    let err = LogscopeConfig::from_file(&config_path)
        .await
        .expect_err("missing file should fail to load");
    assert!(matches!(
        err,
        LogscopeError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn test_config_rejects_undefined_machine() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let broken = VALID_CONFIG.replace(
        "machines = [\"itg-host-01\", \"itg-host-02\"]",
        "machines = [\"itg-host-01\", \"itg-host-99\"]",
    );
    let config_path = write_config(&temp_dir, "logscope.toml", &broken);

    let err = LogscopeConfig::from_file(&config_path)
        .await
        .expect_err("environment references an undefined machine");
    assert!(err.to_string().contains("itg-host-99"));
}

#[tokio::test]
async fn test_config_rejects_bad_legacy_tag() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let broken = VALID_CONFIG.replace("tag = \"|\"", "tag = \"<=>\"");
    let config_path = write_config(&temp_dir, "logscope.toml", &broken);

    let err = LogscopeConfig::from_file(&config_path)
        .await
        .expect_err("three-character legacy tag is invalid");
    assert!(err.to_string().contains("log_types.tag"));
}

#[tokio::test]
async fn test_config_boundary_utilization() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let full = VALID_CONFIG.replace("utilization = 0.5", "utilization = 1.0");
    let path = write_config(&temp_dir, "full.toml", &full);
    assert!(LogscopeConfig::from_file(&path).await.is_ok(), "1.0 is allowed");

    let zero = VALID_CONFIG.replace("utilization = 0.5", "utilization = 0.0");
    let path = write_config(&temp_dir, "zero.toml", &zero);
    assert!(LogscopeConfig::from_file(&path).await.is_err(), "0.0 is rejected");
}

#[tokio::test]
async fn test_config_unicode_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let unicode = VALID_CONFIG.replace("\"Message\"]\ntag = \"|\"", "\"메시지\"]\ntag = \"|\"");
    let config_path = write_config(&temp_dir, "logscope.toml", &unicode);

    let config = LogscopeConfig::from_file(&config_path)
        .await
        .expect("unicode headers should load");
    assert_eq!(config.log_types[0].headers[2], "메시지");
}

#[tokio::test]
#[serial_test::serial]
async fn test_config_env_override_applies_after_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "logscope.toml", VALID_CONFIG);

    // SAFETY: serialised by serial_test; no other thread reads this variable concurrently.
    unsafe { std::env::set_var("LOGSCOPE_SEARCH_FAILURE_POLICY", "fail_fast") };
    let result = LogscopeConfig::load(&config_path).await;
    unsafe { std::env::remove_var("LOGSCOPE_SEARCH_FAILURE_POLICY") };

    let config = result.expect("config should load");
    assert_eq!(config.search.failure_policy, FailurePolicy::FailFast);
}

#[tokio::test]
#[serial_test::serial]
async fn test_config_env_override_is_validated() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "logscope.toml", VALID_CONFIG);

    // SAFETY: serialised by serial_test; no other thread reads this variable concurrently.
    unsafe { std::env::set_var("LOGSCOPE_SEARCH_UTILIZATION", "1.5") };
    let result = LogscopeConfig::load(&config_path).await;
    unsafe { std::env::remove_var("LOGSCOPE_SEARCH_UTILIZATION") };

    assert!(result.is_err(), "overridden utilization must still be in (0, 1]");
}
