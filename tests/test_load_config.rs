use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

use buses::load_config::{load_config, SCAN_CONCURRENCY_ENV};
use buses::{Service, WritePolicy};

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

/// A config with two networks loads with defaults filled in.
#[test]
#[serial]
fn test_load_config_two_services() {
    env::remove_var(SCAN_CONCURRENCY_ENV);
    let file = config_file(
        r#"
services:
  - name: vigo-bus
    stop_writes: first_success
    scan_concurrency: 8
  - name: hamburg-bus
"#,
    );

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.services.len(), 2);
    let vigo = config.service("vigo-bus").expect("vigo present");
    assert_eq!(vigo.stop_writes, WritePolicy::FirstSuccess);
    assert_eq!(vigo.scan_concurrency, 8);

    let hamburg = config.service("hamburg-bus").expect("hamburg present");
    assert_eq!(hamburg.stop_writes, WritePolicy::Everywhere);
    assert_eq!(hamburg.scan_concurrency, 10);

    let service = Service::from_config(hamburg.clone());
    assert_eq!(service.name(), "hamburg-bus");
    assert_eq!(service.config().stop_writes, WritePolicy::Everywhere);
}

#[test]
#[serial]
fn test_env_overrides_scan_concurrency() {
    let file = config_file(
        r#"
services:
  - name: vigo-bus
    scan_concurrency: 8
"#,
    );

    env::set_var(SCAN_CONCURRENCY_ENV, "2");
    let config = load_config(file.path());
    env::remove_var(SCAN_CONCURRENCY_ENV);

    let config = config.expect("Config should load");
    assert_eq!(config.services[0].scan_concurrency, 2);
}

#[test]
#[serial]
fn test_invalid_env_override_is_rejected() {
    let file = config_file("services:\n  - name: vigo-bus\n");

    env::set_var(SCAN_CONCURRENCY_ENV, "many");
    let result = load_config(file.path());
    env::remove_var(SCAN_CONCURRENCY_ENV);

    let err = result.expect_err("non-numeric override must fail");
    assert!(err.to_string().contains(SCAN_CONCURRENCY_ENV));
}

#[test]
#[serial]
fn test_duplicate_service_names_are_rejected() {
    env::remove_var(SCAN_CONCURRENCY_ENV);
    let file = config_file(
        r#"
services:
  - name: vigo-bus
  - name: vigo-bus
"#,
    );

    let err = load_config(file.path()).expect_err("duplicates must fail");
    assert!(err.to_string().contains("Duplicate service name"));
}

#[test]
#[serial]
fn test_zero_concurrency_is_rejected() {
    env::remove_var(SCAN_CONCURRENCY_ENV);
    let file = config_file("services:\n  - name: vigo-bus\n    scan_concurrency: 0\n");

    assert!(load_config(file.path()).is_err());
}

#[test]
#[serial]
fn test_unknown_write_policy_is_rejected() {
    env::remove_var(SCAN_CONCURRENCY_ENV);
    let file = config_file("services:\n  - name: vigo-bus\n    stop_writes: sometimes\n");

    let err = load_config(file.path()).expect_err("unknown policy must fail");
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

#[test]
fn test_missing_file_is_reported() {
    let err = load_config("/definitely/not/here.yaml").expect_err("missing file must fail");
    assert!(err.to_string().contains("Failed to read config file"));
}
