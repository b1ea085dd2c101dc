// system-tests/tests/suites/tenant_gateway.rs
// ============================================================================
// Module: Tenant Gateway Tests
// Description: Table and row operations through a live tenant pool.
// Purpose: Ensure generated statements run unchanged on PostgreSQL.
// Dependencies: system-tests helpers, tenantdb-core, tenantdb-store-postgres
// ============================================================================

//! ## Overview
//! Drives [`TenantGateway`] over a [`PostgresTenantPool`] connected to the
//! fixture database. Tables use unique names so tests never collide.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::missing_docs_in_private_items,
    reason = "System tests use unwrap, expect, and asserts for setup clarity."
)]

use std::collections::BTreeMap;

use tenantdb_core::IdentifierPolicy;
use tenantdb_core::PoolFactory;
use tenantdb_core::Row;
use tenantdb_core::RowValue;
use tenantdb_core::StatementBuilder;
use tenantdb_core::TenantError;
use tenantdb_core::TenantGateway;
use tenantdb_core::Username;
use tenantdb_store_postgres::PostgresPoolFactory;
use tenantdb_store_postgres::PostgresTenantPool;
use tenantdb_store_postgres::TenantPoolSettings;

use crate::helpers::infra::PostgresFixture;
use crate::helpers::unique_name;

fn open_pool(fixture: &PostgresFixture) -> PostgresTenantPool {
    let username = Username::parse(&unique_name("tenant")).unwrap();
    PostgresPoolFactory::new(TenantPoolSettings::default())
        .create(&username, &fixture.connection)
        .expect("tenant pool")
}

fn gateway(pool: &PostgresTenantPool) -> TenantGateway<'_, PostgresTenantPool> {
    TenantGateway::new(pool, StatementBuilder::new(IdentifierPolicy::Strict))
}

fn columns(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(name, kind)| ((*name).to_string(), (*kind).to_string())).collect()
}

fn row(pairs: &[(&str, RowValue)]) -> Row {
    pairs.iter().map(|(name, value)| ((*name).to_string(), value.clone())).collect()
}

#[test]
fn test_connection_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let pool = open_pool(&fixture);
    gateway(&pool).test_connection()?;
    Ok(())
}

#[test]
fn crud_flow_round_trips_typed_values() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let pool = open_pool(&fixture);
    let gateway = gateway(&pool);
    let table = unique_name("items");

    gateway.create_table(
        &table,
        &columns(&[("name", "text"), ("qty", "integer"), ("price", "real"), ("active", "boolean")]),
    )?;
    assert!(gateway.list_tables()?.contains(&table));

    let id = gateway.insert(
        &table,
        &row(&[
            ("name", RowValue::Text("widget".to_string())),
            ("qty", RowValue::Integer(3)),
            ("price", RowValue::Real(2.5)),
            ("active", RowValue::Bool(true)),
        ]),
    )?;
    assert!(id >= 1);

    let rows = gateway.get_all(&table)?;
    assert_eq!(rows.len(), 1);
    let stored = &rows[0];
    assert_eq!(stored.get("id"), Some(&RowValue::Integer(id)));
    assert_eq!(stored.get("name"), Some(&RowValue::Text("widget".to_string())));
    assert_eq!(stored.get("qty"), Some(&RowValue::Integer(3)));
    assert_eq!(stored.get("price"), Some(&RowValue::Real(2.5)));
    assert_eq!(stored.get("active"), Some(&RowValue::Bool(true)));

    assert_eq!(gateway.update(&table, 999_999, &row(&[("qty", RowValue::Integer(9))]))?, 0);
    assert_eq!(gateway.update(&table, id, &row(&[("qty", RowValue::Integer(9))]))?, 1);
    let rows = gateway.get_all(&table)?;
    assert_eq!(rows[0].get("qty"), Some(&RowValue::Integer(9)));

    assert_eq!(gateway.delete(&table, id)?, 1);
    assert_eq!(gateway.delete(&table, id)?, 0);
    assert!(gateway.get_all(&table)?.is_empty());
    Ok(())
}

#[test]
fn null_values_are_stored_as_null() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let pool = open_pool(&fixture);
    let gateway = gateway(&pool);
    let table = unique_name("notes");
    gateway.create_table(&table, &columns(&[("body", "text")]))?;

    gateway.insert(&table, &row(&[("body", RowValue::Null)]))?;
    let rows = gateway.get_all(&table)?;

    assert_eq!(rows[0].get("body"), Some(&RowValue::Null));
    Ok(())
}

#[test]
fn duplicate_table_is_query_failed() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let pool = open_pool(&fixture);
    let gateway = gateway(&pool);
    let table = unique_name("twice");
    gateway.create_table(&table, &columns(&[("label", "text")]))?;

    let err = gateway.create_table(&table, &columns(&[("label", "text")])).unwrap_err();

    assert!(matches!(err, TenantError::QueryFailed(_)), "{err}");
    Ok(())
}

#[test]
fn unknown_column_is_query_failed() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let pool = open_pool(&fixture);
    let gateway = gateway(&pool);
    let table = unique_name("strict");
    gateway.create_table(&table, &columns(&[("label", "text")]))?;

    let err = gateway
        .insert(&table, &row(&[("missing", RowValue::Text("x".to_string()))]))
        .unwrap_err();

    assert!(matches!(err, TenantError::QueryFailed(_)), "{err}");
    Ok(())
}
