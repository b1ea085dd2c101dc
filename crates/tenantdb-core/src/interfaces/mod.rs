// crates/tenantdb-core/src/interfaces/mod.rs
// ============================================================================
// Module: Tenant DB Interfaces
// Description: Backend-agnostic interfaces for containers, registry, and pools.
// Purpose: Define the contract surfaces used by the Tenant DB runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how Tenant DB integrates with the container runtime, the
//! registry database, and tenant databases without embedding backend-specific
//! details. All methods are blocking; async transports call them from a
//! blocking thread pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ContainerName;
use crate::core::Row;
use crate::core::RowValue;
use crate::core::TenantError;
use crate::core::TenantRecord;
use crate::core::Username;

// ============================================================================
// SECTION: Container Runtime
// ============================================================================

/// Shared bridge network handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandle {
    /// Runtime network identifier.
    pub id: String,
    /// Network name.
    pub name: String,
    /// True when this call created the network.
    pub created: bool,
}

/// Request to launch a tenant database container.
#[derive(Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Deterministic container name.
    pub name: ContainerName,
    /// Tenant username (initial superuser and database name).
    pub username: Username,
    /// Initial superuser password.
    pub password: String,
    /// Host port bound to the database port.
    pub host_port: u16,
    /// Shared network to attach to.
    pub network: String,
}

impl std::fmt::Debug for ContainerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerSpec")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host_port", &self.host_port)
            .field("network", &self.network)
            .finish()
    }
}

/// Reference to an existing container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Runtime container identifier.
    pub id: String,
    /// Container name.
    pub name: ContainerName,
}

/// Result of a container launch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedContainer {
    /// Handle to the container.
    pub handle: ContainerHandle,
    /// Hostname resolvable on the shared network.
    pub hostname: String,
    /// Host port bound to the database port.
    pub host_port: u16,
}

/// Container lifecycle contract.
pub trait ContainerRuntime {
    /// Returns the named bridge network, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::CreationFailed`] when the network cannot be
    /// inspected or created.
    fn ensure_network(&self, name: &str) -> Result<NetworkHandle, TenantError>;

    /// Launches a tenant database container and returns without waiting for
    /// the engine to accept connections.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::CreationFailed`] when the launch fails.
    fn create_database_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ProvisionedContainer, TenantError>;

    /// Finds a container by its deterministic name.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::NotFound`] when no such container exists.
    fn locate_container(&self, name: &ContainerName) -> Result<ContainerHandle, TenantError>;
}

// ============================================================================
// SECTION: Raw SQL Shell
// ============================================================================

/// Executes operator SQL through the database client inside a container.
pub trait SqlShell {
    /// Runs SQL text and returns the client's stdout.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::QueryFailed`] on a nonzero client exit or
    /// timeout.
    fn run(
        &self,
        container: &ContainerHandle,
        sql: &str,
        db_user: &str,
        db_name: &str,
    ) -> Result<String, TenantError>;
}

// ============================================================================
// SECTION: Registry Store
// ============================================================================

/// Durable username to tenant record mapping.
pub trait RegistryStore {
    /// Creates the registry table when absent.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::QueryFailed`] when the schema cannot be created.
    fn init_schema(&self) -> Result<(), TenantError>;

    /// Inserts a record in its own committed transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::DuplicateUsername`] when the username exists and
    /// [`TenantError::QueryFailed`] on transport failures.
    fn save(&self, record: &TenantRecord) -> Result<(), TenantError>;

    /// Loads a record by username.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::QueryFailed`] on transport failures.
    fn get(&self, username: &Username) -> Result<Option<TenantRecord>, TenantError>;

    /// Lists every record ordered by username.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::QueryFailed`] on transport failures.
    fn list(&self) -> Result<Vec<TenantRecord>, TenantError>;
}

// ============================================================================
// SECTION: Tenant Databases
// ============================================================================

/// Connection pool for one tenant database.
pub trait TenantDatabase {
    /// Runs a round-trip liveness query.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::PoolExhausted`] when no connection frees up in
    /// time and [`TenantError::QueryFailed`] when the query fails.
    fn ping(&self) -> Result<(), TenantError>;

    /// Executes a statement with bound parameters and returns affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::PoolExhausted`] or [`TenantError::QueryFailed`].
    fn execute(&self, sql: &str, params: &[RowValue]) -> Result<u64, TenantError>;

    /// Runs a query with bound parameters and returns decoded rows.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::PoolExhausted`] or [`TenantError::QueryFailed`].
    fn query(&self, sql: &str, params: &[RowValue]) -> Result<Vec<Row>, TenantError>;
}

/// Builds tenant pools for the pool registry.
pub trait PoolFactory {
    /// Pool type produced by this factory.
    type Pool: TenantDatabase + Send + Sync;

    /// Builds a pool and verifies it is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::CreationFailed`] when the pool cannot be built
    /// or the liveness check fails within the creation timeout.
    fn create(&self, username: &Username, connection: &str) -> Result<Self::Pool, TenantError>;
}

// ============================================================================
// SECTION: Lifecycle Observer
// ============================================================================

/// Lifecycle events emitted by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A tenant container was launched and recorded.
    TenantProvisioned {
        /// Tenant username.
        username: Username,
        /// Container identifier.
        container_id: String,
        /// Host port bound to the container.
        host_port: u16,
    },
    /// Registration stopped at a stage.
    RegistrationFailed {
        /// Tenant username.
        username: Username,
        /// Stage label (`port`, `network`, `container`, `registry`).
        stage: &'static str,
        /// Failure.
        error: TenantError,
    },
    /// A tenant pool was built.
    PoolCreated {
        /// Tenant username.
        username: Username,
    },
    /// Building a tenant pool failed.
    PoolCreationFailed {
        /// Tenant username.
        username: Username,
        /// Failure.
        error: TenantError,
    },
    /// A tenant pool was dropped from the registry.
    PoolEvicted {
        /// Tenant username.
        username: Username,
    },
}

/// Receives lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Handles a lifecycle event. Must not block for long.
    fn on_event(&self, event: &LifecycleEvent);
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {
    fn on_event(&self, _event: &LifecycleEvent) {}
}
