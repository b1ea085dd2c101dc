// crates/tenantdb-store-postgres/tests/postgres_store.rs
// ============================================================================
// Module: Postgres Store Tests
// Description: Configuration and failure handling without a live database.
// Purpose: Validate error mapping for registry and tenant pool construction.
// ============================================================================

//! Postgres store unit tests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Tests use unwrap and expect for setup clarity."
)]

use std::time::Duration;
use std::time::Instant;

use tenantdb_core::PoolFactory;
use tenantdb_core::RegistryStore;
use tenantdb_core::TenantError;
use tenantdb_core::Username;
use tenantdb_store_postgres::PostgresPoolFactory;
use tenantdb_store_postgres::PostgresRegistryConfig;
use tenantdb_store_postgres::PostgresRegistryStore;
use tenantdb_store_postgres::TenantPoolSettings;
use tenantdb_store_postgres::shared_postgres_registry;

/// Connection string for a port nothing listens on.
const REFUSED: &str = "host=127.0.0.1 port=1 user=nobody password=nothing dbname=nothing";

fn quick_settings() -> TenantPoolSettings {
    TenantPoolSettings {
        pool_size: 1,
        max_overflow: 0,
        acquire_timeout: Duration::from_millis(200),
        creation_timeout: Duration::from_millis(300),
    }
}

#[test]
fn registry_default_config_is_valid_shape() {
    let config = PostgresRegistryConfig::default();
    assert!(!config.connection.is_empty());
    assert!(config.max_connections > 0);
    assert!(config.connect_timeout_ms > 0);
    assert!(config.statement_timeout_ms > 0);
}

#[test]
fn registry_config_serde_roundtrip() {
    let original = PostgresRegistryConfig::default();
    let json = serde_json::to_string(&original).expect("serialize");
    let restored: PostgresRegistryConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(original.connection, restored.connection);
    assert_eq!(original.max_connections, restored.max_connections);
}

#[test]
fn registry_invalid_connection_string_fails() {
    let config = PostgresRegistryConfig {
        connection: "host='unterminated".to_string(),
        ..PostgresRegistryConfig::default()
    };
    assert!(shared_postgres_registry(&config).is_err());
}

#[test]
fn registry_zero_connections_rejected() {
    let config = PostgresRegistryConfig {
        max_connections: 0,
        ..PostgresRegistryConfig::default()
    };
    assert!(PostgresRegistryStore::new(&config).is_err());
}

#[test]
fn registry_unreachable_database_is_query_failed() {
    let config = PostgresRegistryConfig {
        connection: REFUSED.to_string(),
        max_connections: 1,
        connect_timeout_ms: 200,
        statement_timeout_ms: 200,
    };
    let store = PostgresRegistryStore::new(&config).unwrap();
    let err = store.init_schema().unwrap_err();
    assert!(matches!(err, TenantError::QueryFailed(_)));
    let err = store.get(&Username::parse("alice").unwrap()).unwrap_err();
    assert_eq!(err.kind(), "query_failed");
}

#[test]
fn pool_settings_size_includes_overflow() {
    assert_eq!(TenantPoolSettings::default().max_size(), 30);
    let empty = TenantPoolSettings {
        pool_size: 0,
        max_overflow: 0,
        ..TenantPoolSettings::default()
    };
    assert_eq!(empty.max_size(), 1);
}

#[test]
fn pool_factory_rejects_malformed_connection() {
    let factory = PostgresPoolFactory::new(quick_settings());
    let err = factory.create(&Username::parse("alice").unwrap(), "host='unterminated").unwrap_err();
    assert!(matches!(err, TenantError::CreationFailed(_)));
}

#[test]
fn pool_factory_unreachable_fails_within_creation_timeout() {
    let factory = PostgresPoolFactory::new(quick_settings());
    let started = Instant::now();
    let err = factory.create(&Username::parse("alice").unwrap(), REFUSED).unwrap_err();
    assert!(matches!(err, TenantError::CreationFailed(_)), "{}", err.kind());
    assert!(started.elapsed() < Duration::from_secs(5));
}
