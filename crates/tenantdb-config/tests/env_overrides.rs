//! Environment override tests for tenantdb-config.
// crates/tenantdb-config/tests/env_overrides.rs
// =============================================================================
// Module: Env Override Tests
// Description: Registry connection overrides from the environment.
// Purpose: Pin precedence between TENANTDB_REGISTRY_URL and MAIN_DB_* parts.
// =============================================================================

use std::collections::BTreeMap;

use tenantdb_config::TenantDbConfig;

type TestResult = Result<(), String>;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: BTreeMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key| vars.get(key).cloned()
}

const MAIN_DB: [(&str, &str); 4] = [
    ("MAIN_DB_HOST", "registry:5433"),
    ("MAIN_DB_NAME", "main"),
    ("MAIN_DB_USER", "admin"),
    ("MAIN_DB_PASSWORD", "hunter2"),
];

#[test]
fn registry_url_replaces_connection() -> TestResult {
    let mut config = TenantDbConfig::default();
    config.apply_env_overrides(lookup(&[("TENANTDB_REGISTRY_URL", "postgresql://a:b@db/main")]));
    if config.registry.connection != "postgresql://a:b@db/main" {
        return Err(format!("unexpected connection: {}", config.registry.connection));
    }
    Ok(())
}

#[test]
fn main_db_parts_compose_connection() -> TestResult {
    let mut config = TenantDbConfig::default();
    config.apply_env_overrides(lookup(&MAIN_DB));
    let expected = "host='registry' port=5433 user='admin' password='hunter2' dbname='main'";
    if config.registry.connection != expected {
        return Err(format!("unexpected connection: {}", config.registry.connection));
    }
    if config.registry.redacted_connection().contains("hunter2") {
        return Err("redacted connection leaked the password".to_string());
    }
    Ok(())
}

#[test]
fn main_db_password_is_quoted_for_conninfo() -> TestResult {
    let mut pairs = MAIN_DB.to_vec();
    pairs[3] = ("MAIN_DB_PASSWORD", "it's a \\secret");
    let mut config = TenantDbConfig::default();
    config.apply_env_overrides(lookup(&pairs));
    let expected = "host='registry' port=5433 user='admin' password='it\\'s a \\\\secret' \
                    dbname='main'";
    if config.registry.connection != expected {
        return Err(format!("unexpected connection: {}", config.registry.connection));
    }
    Ok(())
}

#[test]
fn partial_main_db_parts_are_ignored() -> TestResult {
    let mut config = TenantDbConfig::default();
    config.apply_env_overrides(lookup(&MAIN_DB[..3]));
    if config.registry.connection != TenantDbConfig::default().registry.connection {
        return Err("partial MAIN_DB_* should not change the connection".to_string());
    }
    Ok(())
}

#[test]
fn registry_url_wins_over_main_db_parts() -> TestResult {
    let mut pairs = MAIN_DB.to_vec();
    pairs.push(("TENANTDB_REGISTRY_URL", "host=override"));
    let mut config = TenantDbConfig::default();
    config.apply_env_overrides(lookup(&pairs));
    if config.registry.connection != "host=override" {
        return Err(format!("unexpected connection: {}", config.registry.connection));
    }
    Ok(())
}

#[test]
fn debug_output_redacts_registry_password() -> TestResult {
    let mut config = TenantDbConfig::default();
    config.apply_env_overrides(lookup(&MAIN_DB));
    #[allow(clippy::use_debug, reason = "Asserts on the Debug rendering itself.")]
    let rendered = format!("{:?}", config.registry);
    if rendered.contains("hunter2") {
        return Err("debug output leaked the password".to_string());
    }
    Ok(())
}
