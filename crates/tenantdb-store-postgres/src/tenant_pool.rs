// crates/tenantdb-store-postgres/src/tenant_pool.rs
// ============================================================================
// Module: Postgres Tenant Pools
// Description: Per-tenant r2d2 pools built on demand by the pool registry.
// Purpose: Execute gateway statements against a tenant's own database.
// Dependencies: tenantdb-core, postgres, r2d2, r2d2_postgres
// ============================================================================

//! ## Overview
//! [`PostgresPoolFactory`] turns a tenant connection string into a
//! [`PostgresTenantPool`]. Construction is bounded by the creation timeout and
//! proves reachability with `SELECT 1`; any failure is
//! [`TenantError::CreationFailed`]. A built pool holds `pool_size` idle
//! connections and grows by up to `max_overflow`. Acquiring a connection
//! beyond that waits for the acquire timeout and then fails with
//! [`TenantError::PoolExhausted`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use postgres::NoTls;
use r2d2::Pool;
use r2d2::PooledConnection;
use r2d2_postgres::PostgresConnectionManager;
use tenantdb_core::PoolFactory;
use tenantdb_core::Row;
use tenantdb_core::RowValue;
use tenantdb_core::TenantDatabase;
use tenantdb_core::TenantError;
use tenantdb_core::Username;

use crate::values::as_params;
use crate::values::bind;
use crate::values::decode_row;

/// Pooled tenant connection.
type TenantConnection = PooledConnection<PostgresConnectionManager<NoTls>>;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Sizing and timeouts applied to every tenant pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantPoolSettings {
    /// Idle connections kept open.
    pub pool_size: u32,
    /// Extra connections allowed above `pool_size`.
    pub max_overflow: u32,
    /// Wait for a free connection before reporting exhaustion.
    pub acquire_timeout: Duration,
    /// Bound on connecting and the liveness check during creation.
    pub creation_timeout: Duration,
}

impl Default for TenantPoolSettings {
    fn default() -> Self {
        Self {
            pool_size: 10,
            max_overflow: 20,
            acquire_timeout: Duration::from_secs(30),
            creation_timeout: Duration::from_secs(5),
        }
    }
}

impl TenantPoolSettings {
    /// Maximum open connections per pool.
    #[must_use]
    pub const fn max_size(&self) -> u32 {
        let total = self.pool_size.saturating_add(self.max_overflow);
        if total == 0 { 1 } else { total }
    }
}

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Builds tenant pools for the pool registry.
#[derive(Debug, Clone, Default)]
pub struct PostgresPoolFactory {
    /// Settings applied to each pool.
    settings: TenantPoolSettings,
}

impl PostgresPoolFactory {
    /// Creates a factory with the given settings.
    #[must_use]
    pub const fn new(settings: TenantPoolSettings) -> Self {
        Self {
            settings,
        }
    }

    /// Returns the pool settings.
    #[must_use]
    pub const fn settings(&self) -> TenantPoolSettings {
        self.settings
    }
}

impl PoolFactory for PostgresPoolFactory {
    type Pool = PostgresTenantPool;

    fn create(
        &self,
        username: &Username,
        connection: &str,
    ) -> Result<PostgresTenantPool, TenantError> {
        let creation_timeout = non_zero(self.settings.creation_timeout);
        let mut pg_config = connection.parse::<postgres::Config>().map_err(|err| {
            TenantError::CreationFailed(format!("invalid connection for {username}: {err}"))
        })?;
        pg_config.connect_timeout(creation_timeout);
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let max_size = self.settings.max_size();
        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(self.settings.pool_size.min(max_size)))
            .connection_timeout(creation_timeout)
            .build_unchecked(manager);
        let tenant_pool = PostgresTenantPool {
            pool: Some(pool),
            acquire_timeout: non_zero(self.settings.acquire_timeout),
        };
        let mut conn = tenant_pool.checkout(creation_timeout).map_err(|err| {
            TenantError::CreationFailed(format!("{username} unreachable: {}", err.detail()))
        })?;
        conn.simple_query("SELECT 1").map_err(|err| {
            TenantError::CreationFailed(format!("{username} liveness check failed: {err}"))
        })?;
        drop(conn);
        Ok(tenant_pool)
    }
}

/// Clamps a zero timeout to the smallest value r2d2 accepts.
fn non_zero(timeout: Duration) -> Duration {
    timeout.max(Duration::from_millis(1))
}

// ============================================================================
// SECTION: Tenant Pool
// ============================================================================

/// Connection pool for one tenant database.
#[derive(Debug)]
pub struct PostgresTenantPool {
    /// Underlying r2d2 pool.
    pool: Option<Pool<PostgresConnectionManager<NoTls>>>,
    /// Wait for a free connection before reporting exhaustion.
    acquire_timeout: Duration,
}

impl Drop for PostgresTenantPool {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            let _ = std::thread::spawn(move || drop(pool));
        }
    }
}

impl PostgresTenantPool {
    /// Checks out a connection for exclusive use.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::PoolExhausted`] when every connection stays
    /// busy for the acquire timeout, and [`TenantError::QueryFailed`] when
    /// the database cannot be reached.
    pub fn acquire(&self) -> Result<TenantConnection, TenantError> {
        self.checkout(self.acquire_timeout)
    }

    /// Checks out a connection, waiting at most `timeout`.
    fn checkout(&self, timeout: Duration) -> Result<TenantConnection, TenantError> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| TenantError::QueryFailed("tenant pool closed".to_string()))?;
        pool.get_timeout(timeout).map_err(|err| {
            let state = pool.state();
            if state.connections >= pool.max_size() && state.idle_connections == 0 {
                TenantError::PoolExhausted(format!(
                    "all {} connections busy after {}ms",
                    pool.max_size(),
                    timeout.as_millis()
                ))
            } else {
                TenantError::QueryFailed(format!("tenant database unavailable: {err}"))
            }
        })
    }
}

impl TenantDatabase for PostgresTenantPool {
    fn ping(&self) -> Result<(), TenantError> {
        let mut conn = self.acquire()?;
        conn.simple_query("SELECT 1").map_err(|err| TenantError::QueryFailed(err.to_string()))?;
        Ok(())
    }

    fn execute(&self, sql: &str, params: &[RowValue]) -> Result<u64, TenantError> {
        let mut conn = self.acquire()?;
        let values = bind(params);
        conn.execute(sql, &as_params(&values)).map_err(|err| TenantError::QueryFailed(err.to_string()))
    }

    fn query(&self, sql: &str, params: &[RowValue]) -> Result<Vec<Row>, TenantError> {
        let mut conn = self.acquire()?;
        let values = bind(params);
        let rows = conn
            .query(sql, &as_params(&values))
            .map_err(|err| TenantError::QueryFailed(err.to_string()))?;
        rows.iter().map(decode_row).collect()
    }
}
