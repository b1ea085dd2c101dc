// crates/tenantdb-store-postgres/src/registry.rs
// ============================================================================
// Module: Postgres Registry Store
// Description: PostgreSQL-backed registry of provisioned tenants.
// Purpose: Durable username to tenant record mapping for the service.
// Dependencies: tenantdb-core, postgres, r2d2, r2d2_postgres
// ============================================================================

//! ## Overview
//! The registry lives in a `users` table in the central database. Each save
//! is a single-row insert committed in its own transaction, so a failed save
//! leaves no row behind. A unique violation on `username` is reported as
//! [`TenantError::DuplicateUsername`]; every other failure is
//! [`TenantError::QueryFailed`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use postgres::NoTls;
use postgres::error::SqlState;
use r2d2::Pool;
use r2d2::PooledConnection;
use r2d2_postgres::PostgresConnectionManager;
use serde::Deserialize;
use serde::Serialize;
use tenantdb_core::RegistryStore;
use tenantdb_core::SharedRegistryStore;
use tenantdb_core::TenantError;
use tenantdb_core::TenantRecord;
use tenantdb_core::Username;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Idempotent registry schema.
const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS users (id SERIAL PRIMARY KEY, username \
                          VARCHAR(100) UNIQUE NOT NULL, password VARCHAR(100) NOT NULL, \
                          registration_time TIMESTAMP NOT NULL, container_id VARCHAR(100) NOT \
                          NULL, container_hostname VARCHAR(100) NOT NULL, container_port INTEGER \
                          NOT NULL)";
/// Columns read back into a [`TenantRecord`], in decode order.
const RECORD_COLUMNS: &str = "username, password, to_char(registration_time, 'YYYY-MM-DD \
                              HH24:MI:SS'), container_id, container_hostname, container_port";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Registry connection settings.
#[derive(Clone, Deserialize, Serialize)]
pub struct PostgresRegistryConfig {
    /// `PostgreSQL` connection string.
    pub connection: String,
    /// Maximum pool size.
    pub max_connections: u32,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Statement timeout in milliseconds.
    pub statement_timeout_ms: u64,
}

impl Default for PostgresRegistryConfig {
    fn default() -> Self {
        Self {
            connection: "host=localhost port=5432 user=postgres dbname=tenantdb".to_string(),
            max_connections: 8,
            connect_timeout_ms: 5_000,
            statement_timeout_ms: 10_000,
        }
    }
}

impl std::fmt::Debug for PostgresRegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRegistryConfig")
            .field("connection", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("statement_timeout_ms", &self.statement_timeout_ms)
            .finish()
    }
}

/// Postgres registry errors raised while building the store.
#[derive(Debug, Error)]
pub enum PostgresStoreError {
    /// Connection string or pool construction failure.
    #[error("postgres store error: {0}")]
    Postgres(String),
    /// Invalid configuration.
    #[error("postgres store invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Postgres-backed registry store.
pub struct PostgresRegistryStore {
    /// Connection pool for registry access.
    pool: Option<Pool<PostgresConnectionManager<NoTls>>>,
}

impl Drop for PostgresRegistryStore {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            let _ = std::thread::spawn(move || drop(pool));
        }
    }
}

impl PostgresRegistryStore {
    /// Creates a registry store. Connections are opened lazily; call
    /// [`RegistryStore::init_schema`] to verify reachability.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresStoreError`] when the configuration is invalid.
    pub fn new(config: &PostgresRegistryConfig) -> Result<Self, PostgresStoreError> {
        if config.max_connections == 0 {
            return Err(PostgresStoreError::Invalid("max_connections must be nonzero".to_string()));
        }
        let mut pg_config = config
            .connection
            .parse::<postgres::Config>()
            .map_err(|err| PostgresStoreError::Postgres(err.to_string()))?;
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms.max(1));
        pg_config.connect_timeout(connect_timeout);
        let options = format!("-c statement_timeout={}", config.statement_timeout_ms);
        pg_config.options(&options);
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(0))
            .connection_timeout(connect_timeout)
            .build_unchecked(manager);
        Ok(Self {
            pool: Some(pool),
        })
    }

    /// Checks out a registry connection.
    fn connection(
        &self,
    ) -> Result<PooledConnection<PostgresConnectionManager<NoTls>>, TenantError> {
        self.pool
            .as_ref()
            .ok_or_else(|| TenantError::QueryFailed("registry store closed".to_string()))?
            .get()
            .map_err(|err| TenantError::QueryFailed(format!("registry unavailable: {err}")))
    }
}

impl RegistryStore for PostgresRegistryStore {
    fn init_schema(&self) -> Result<(), TenantError> {
        let mut conn = self.connection()?;
        conn.batch_execute(SCHEMA_SQL).map_err(|err| TenantError::QueryFailed(err.to_string()))
    }

    fn save(&self, record: &TenantRecord) -> Result<(), TenantError> {
        let mut conn = self.connection()?;
        let mut tx = conn.transaction().map_err(|err| TenantError::QueryFailed(err.to_string()))?;
        let inserted = tx.execute(
            "INSERT INTO users (username, password, registration_time, container_id, \
             container_hostname, container_port) VALUES ($1, $2, $3::text::timestamp, $4, $5, $6)",
            &[
                &record.username.as_str(),
                &record.password,
                &record.registration_time(),
                &record.container_id,
                &record.container_hostname,
                &i32::from(record.container_port),
            ],
        );
        if let Err(err) = inserted {
            if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                return Err(TenantError::DuplicateUsername(record.username.to_string()));
            }
            return Err(TenantError::QueryFailed(err.to_string()));
        }
        tx.commit().map_err(|err| TenantError::QueryFailed(err.to_string()))
    }

    fn get(&self, username: &Username) -> Result<Option<TenantRecord>, TenantError> {
        let mut conn = self.connection()?;
        let sql = format!("SELECT {RECORD_COLUMNS} FROM users WHERE username = $1");
        let row = conn
            .query_opt(sql.as_str(), &[&username.as_str()])
            .map_err(|err| TenantError::QueryFailed(err.to_string()))?;
        row.as_ref().map(decode_record).transpose()
    }

    fn list(&self) -> Result<Vec<TenantRecord>, TenantError> {
        let mut conn = self.connection()?;
        let sql = format!("SELECT {RECORD_COLUMNS} FROM users ORDER BY id");
        let rows =
            conn.query(sql.as_str(), &[]).map_err(|err| TenantError::QueryFailed(err.to_string()))?;
        rows.iter().map(decode_record).collect()
    }
}

/// Decodes a registry row selected with [`RECORD_COLUMNS`].
fn decode_record(row: &postgres::Row) -> Result<TenantRecord, TenantError> {
    let corrupt = |err: postgres::Error| TenantError::QueryFailed(format!("registry row: {err}"));
    let username: String = row.try_get(0).map_err(corrupt)?;
    let registered: String = row.try_get(2).map_err(corrupt)?;
    let port: i32 = row.try_get(5).map_err(corrupt)?;
    Ok(TenantRecord {
        username: Username::parse(&username)?,
        password: row.try_get(1).map_err(corrupt)?,
        container_id: row.try_get(3).map_err(corrupt)?,
        container_hostname: row.try_get(4).map_err(corrupt)?,
        container_port: u16::try_from(port)
            .map_err(|_| TenantError::QueryFailed(format!("registry port out of range: {port}")))?,
        registered_at: TenantRecord::parse_registration_time(&registered)?,
    })
}

/// Builds a shared registry store from configuration.
///
/// # Errors
///
/// Returns [`PostgresStoreError`] when the configuration is invalid.
pub fn shared_postgres_registry(
    config: &PostgresRegistryConfig,
) -> Result<SharedRegistryStore, PostgresStoreError> {
    Ok(SharedRegistryStore::from_store(PostgresRegistryStore::new(config)?))
}
