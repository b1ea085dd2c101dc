// system-tests/src/config/env_tests.rs
// ============================================================================
// Module: System Test Env Unit Tests
// Description: Unit coverage for environment parsing in system-tests.
// Purpose: Ensure configuration parsing fails closed on invalid inputs.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Drives [`SystemTestConfig::from_lookup`] with in-memory maps.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::collections::BTreeMap;
use std::time::Duration;

use super::SystemTestConfig;
use super::SystemTestEnv;

fn load(pairs: &[(SystemTestEnv, &str)]) -> Result<SystemTestConfig, String> {
    let map: BTreeMap<&str, String> =
        pairs.iter().map(|(key, value)| (key.as_str(), (*value).to_string())).collect();
    SystemTestConfig::from_lookup(|name| Ok(map.get(name).cloned()))
}

#[test]
fn empty_environment_uses_container_defaults() {
    let config = load(&[]).unwrap();
    assert_eq!(config, SystemTestConfig::default());
    assert_eq!(config.image_name, "postgres");
    assert_eq!(config.image_tag, "16-alpine");
    assert!(config.postgres_url.is_none());
}

#[test]
fn overrides_are_applied() {
    let config = load(&[
        (SystemTestEnv::PostgresUrl, "host=db port=5432 user=postgres"),
        (SystemTestEnv::PostgresImage, "registry.local:5000/postgres"),
        (SystemTestEnv::TimeoutSeconds, "15"),
    ])
    .unwrap();
    assert_eq!(config.postgres_url.as_deref(), Some("host=db port=5432 user=postgres"));
    assert_eq!(config.image_name, "registry.local:5000/postgres");
    assert_eq!(config.image_tag, "latest");
    assert_eq!(config.ready_timeout, Duration::from_secs(15));
}

#[test]
fn invalid_values_fail_closed() {
    assert!(load(&[(SystemTestEnv::PostgresUrl, "  ")]).is_err());
    assert!(load(&[(SystemTestEnv::TimeoutSeconds, "0")]).is_err());
    assert!(load(&[(SystemTestEnv::TimeoutSeconds, "soon")]).is_err());
}
