// system-tests/tests/suites/pool_lifecycle.rs
// ============================================================================
// Module: Pool Lifecycle Tests
// Description: Pool registry caching, eviction, and exhaustion on real pools.
// Purpose: Ensure the LRU bound and error kinds hold with live connections.
// Dependencies: system-tests helpers, tenantdb-core, tenantdb-store-postgres
// ============================================================================

//! ## Overview
//! Builds [`PoolRegistry`] over [`PostgresPoolFactory`] pointed at the
//! fixture database, plus one unreachable endpoint for failure paths.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::missing_docs_in_private_items,
    reason = "System tests use unwrap, expect, and asserts for setup clarity."
)]

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tenantdb_core::PoolRegistry;
use tenantdb_core::TenantDatabase;
use tenantdb_core::TenantError;
use tenantdb_core::Username;
use tenantdb_store_postgres::PostgresPoolFactory;
use tenantdb_store_postgres::TenantPoolSettings;

use crate::helpers::infra::PostgresFixture;
use crate::helpers::unique_name;

/// Connection string for a port nothing listens on.
const REFUSED: &str = "host=127.0.0.1 port=1 user=nobody password=nothing dbname=nothing";

fn small_settings() -> TenantPoolSettings {
    TenantPoolSettings {
        pool_size: 1,
        max_overflow: 0,
        acquire_timeout: Duration::from_millis(500),
        creation_timeout: Duration::from_secs(5),
    }
}

fn username(prefix: &str) -> Username {
    Username::parse(&unique_name(prefix)).unwrap()
}

#[test]
fn registry_reuses_pools_and_evicts_least_recent() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let registry = PoolRegistry::new(PostgresPoolFactory::new(small_settings()), 2);
    let first = username("lru_a");
    let second = username("lru_b");
    let third = username("lru_c");

    let pool = registry.get_or_create_pool(&first, &fixture.connection)?;
    let again = registry.get_or_create_pool(&first, &fixture.connection)?;
    assert!(Arc::ptr_eq(&pool, &again));
    drop((pool, again));

    registry.get_or_create_pool(&second, &fixture.connection)?.ping()?;
    registry.get_or_create_pool(&third, &fixture.connection)?.ping()?;
    assert_eq!(registry.len(), 2);
    assert!(!registry.contains(&first));

    registry.get_or_create_pool(&first, &fixture.connection)?.ping()?;
    assert_eq!(registry.created_count(), 4);
    assert!(!registry.contains(&second));
    Ok(())
}

#[test]
fn unreachable_database_fails_creation_within_timeout() {
    let settings = TenantPoolSettings {
        creation_timeout: Duration::from_millis(500),
        ..small_settings()
    };
    let registry = PoolRegistry::new(PostgresPoolFactory::new(settings), 2);
    let tenant = username("down");

    let started = Instant::now();
    let err = registry.get_or_create_pool(&tenant, REFUSED).unwrap_err();

    assert!(matches!(err, TenantError::CreationFailed(_)), "{err}");
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(registry.is_empty());
}

#[test]
fn busy_pool_reports_exhaustion() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = PostgresFixture::start()?;
    let registry = PoolRegistry::new(PostgresPoolFactory::new(small_settings()), 2);
    let tenant = username("busy");
    let pool = registry.get_or_create_pool(&tenant, &fixture.connection)?;

    let held = pool.acquire()?;
    let err = pool.ping().unwrap_err();
    drop(held);

    assert!(matches!(err, TenantError::PoolExhausted(_)), "{err}");
    pool.ping()?;
    Ok(())
}
