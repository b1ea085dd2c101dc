// system-tests/tests/suites/registry_store.rs
// ============================================================================
// Module: Registry Store Tests
// Description: Persist and read tenant records through the Postgres registry.
// Purpose: Ensure the users table enforces unique usernames and round-trips records.
// Dependencies: system-tests helpers, tenantdb-store-postgres
// ============================================================================

//! ## Overview
//! Runs the registry store against a real database. Each test uses fresh
//! usernames so suites can share one database.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::missing_docs_in_private_items,
    reason = "System tests use unwrap, expect, and asserts for setup clarity."
)]

use tenantdb_core::RegistryStore;
use tenantdb_core::TenantError;
use tenantdb_core::TenantRecord;
use tenantdb_core::Username;
use tenantdb_store_postgres::PostgresRegistryConfig;
use tenantdb_store_postgres::PostgresRegistryStore;

use crate::helpers::infra::PostgresFixture;
use crate::helpers::unique_name;

fn open_store(fixture: &PostgresFixture) -> PostgresRegistryStore {
    let config = PostgresRegistryConfig {
        connection: fixture.connection.clone(),
        ..PostgresRegistryConfig::default()
    };
    let store = PostgresRegistryStore::new(&config).expect("registry store");
    store.init_schema().expect("schema");
    store
}

fn record(name: &str, port: u16) -> TenantRecord {
    TenantRecord {
        username: Username::parse(name).unwrap(),
        password: "s3cret-value".to_string(),
        container_id: format!("cid-{name}"),
        container_hostname: format!("tenantdb_{name}"),
        container_port: port,
        registered_at: TenantRecord::now(),
    }
}

#[test]
fn init_schema_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let store = open_store(&fixture);
    store.init_schema()?;
    store.init_schema()?;

    let mut client = fixture.client()?;
    let row = client.query_one(
        "SELECT count(*) FROM information_schema.tables WHERE table_name = 'users'",
        &[],
    )?;
    let count: i64 = row.get(0);
    assert_eq!(count, 1);
    Ok(())
}

#[test]
fn saved_record_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let store = open_store(&fixture);
    let original = record(&unique_name("alice"), 5433);

    store.save(&original)?;
    let loaded = store.get(&original.username)?.expect("record present");

    assert_eq!(loaded, original);
    assert_eq!(loaded.registration_time(), original.registration_time());
    Ok(())
}

#[test]
fn duplicate_username_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let store = open_store(&fixture);
    let first = record(&unique_name("bob"), 5434);
    store.save(&first)?;

    let mut second = record(first.username.as_str(), 5435);
    second.container_id = "cid-other".to_string();
    let err = store.save(&second).unwrap_err();

    assert!(matches!(err, TenantError::DuplicateUsername(_)), "{err}");
    let kept = store.get(&first.username)?.expect("first record kept");
    assert_eq!(kept.container_port, 5434);
    Ok(())
}

#[test]
fn unknown_username_is_absent() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let store = open_store(&fixture);
    let missing = Username::parse(&unique_name("ghost"))?;
    assert!(store.get(&missing)?.is_none());
    Ok(())
}

#[test]
fn list_returns_saved_records_in_registration_order() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let store = open_store(&fixture);
    let first = record(&unique_name("carol"), 5436);
    let second = record(&unique_name("dave"), 5437);
    store.save(&first)?;
    store.save(&second)?;

    let names: Vec<String> =
        store.list()?.into_iter().map(|record| record.username.as_str().to_string()).collect();
    let first_at = names.iter().position(|name| name == first.username.as_str());
    let second_at = names.iter().position(|name| name == second.username.as_str());

    assert!(first_at.is_some() && second_at.is_some());
    assert!(first_at < second_at);
    Ok(())
}
