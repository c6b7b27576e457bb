//! Tests for config file loading and graceful degradation
//!
//! Tests that manipulate XDG_CONFIG_HOME are marked with #[serial] so they do
//! not race each other on the process environment.

use concordance_common::config::TomlConfig;
use concordance_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_full_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
app_system_code = "upp-slc-transformer"
port = 9090
log_level = "debug"
broker_connection_string = "redis://localhost:6379"
topic = "SmartlogicConcept"
group_name = "TestGroup"
writer_address = "http://localhost:8080/__concordance-rw/"
writer_timeout_secs = 5
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();

    assert_eq!(config.app_system_code.as_deref(), Some("upp-slc-transformer"));
    assert_eq!(config.port, Some(9090));
    assert_eq!(config.log_level.as_deref(), Some("debug"));
    assert_eq!(config.group_name.as_deref(), Some("TestGroup"));
    assert_eq!(config.writer_timeout_secs, Some(5));
    // Keys not present in the file stay unset
    assert_eq!(config.app_name, None);
    assert_eq!(config.log_format, None);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "port = \"not a number\"").unwrap();

    let result = TomlConfig::load(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_explicit_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let result = TomlConfig::load_optional(Some(&path));
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("absent.toml")),
        other => panic!("Expected config error, got {:?}", other),
    }
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_default_location_is_discovered() {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("smartlogic-concordance");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "topic = \"FromDefaultLocation\"").unwrap();

    let previous = env::var("XDG_CONFIG_HOME").ok();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let config = TomlConfig::load_optional(None).unwrap();

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(config.topic.as_deref(), Some("FromDefaultLocation"));
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_no_config_file_falls_back_to_empty_config() {
    let dir = TempDir::new().unwrap();

    let previous = env::var("XDG_CONFIG_HOME").ok();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let result = TomlConfig::load_optional(None);

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    // /etc may legitimately hold a system config on the test host
    if !std::path::Path::new("/etc/smartlogic-concordance/config.toml").exists() {
        assert_eq!(result.unwrap(), TomlConfig::default());
    }
}
