// crates/tenantdb-core/src/runtime/service.rs
// ============================================================================
// Module: Tenant Service
// Description: Registration, admin table operations, and tenant CRUD.
// Purpose: Orchestrate ports, containers, registry, pools, and the gateway.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`TenantService`] is the single entry point transports call into.
//!
//! Registration runs: validate, claim the username, registry pre-check,
//! allocate port, ensure network, launch container, save record, then
//! optionally build the pool. The claim is held for the whole registration,
//! so a concurrent registration of the same name fails as a duplicate
//! instead of colliding on the container name.
//! Nothing is rolled back when a later step fails; the error detail names
//! what was left behind (network, container) for manual cleanup.
//!
//! Admin table operations go through the container's SQL shell. Tenant CRUD
//! resolves the record, gets or builds the tenant pool, and runs the
//! gateway.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::core::ContainerName;
use crate::core::IdentifierPolicy;
use crate::core::Row;
use crate::core::TenantEndpoint;
use crate::core::TenantError;
use crate::core::TenantRecord;
use crate::core::Username;
use crate::interfaces::ContainerHandle;
use crate::interfaces::ContainerRuntime;
use crate::interfaces::ContainerSpec;
use crate::interfaces::LifecycleEvent;
use crate::interfaces::LifecycleObserver;
use crate::interfaces::NoopObserver;
use crate::interfaces::PoolFactory;
use crate::interfaces::RegistryStore;
use crate::interfaces::SqlShell;
use crate::runtime::gateway::StatementBuilder;
use crate::runtime::gateway::TenantGateway;
use crate::runtime::listing::LIST_TABLES_SQL;
use crate::runtime::listing::parse_table_listing;
use crate::runtime::pool::PoolRegistry;
use crate::runtime::ports::PortAllocator;
use crate::runtime::store::SharedRegistryStore;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Maximum password length (registry column width).
pub const MAX_PASSWORD_LENGTH: usize = 100;

/// Tenant service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantServiceConfig {
    /// Shared bridge network name.
    pub network: String,
    /// Container name prefix.
    pub name_prefix: String,
    /// How tenant databases are reached.
    pub endpoint: TenantEndpoint,
    /// Identifier policy for generated SQL.
    pub identifier_policy: IdentifierPolicy,
    /// Build the tenant pool during registration.
    pub eager_pools: bool,
}

impl Default for TenantServiceConfig {
    fn default() -> Self {
        Self {
            network: "docker_mynetwork".to_string(),
            name_prefix: "postgres_".to_string(),
            endpoint: TenantEndpoint::default(),
            identifier_policy: IdentifierPolicy::Strict,
            eager_pools: false,
        }
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Tenant lifecycle and data service.
pub struct TenantService<F: PoolFactory> {
    /// Settings.
    config: TenantServiceConfig,
    /// Registry store.
    registry: SharedRegistryStore,
    /// Container runtime.
    runtime: Arc<dyn ContainerRuntime + Send + Sync>,
    /// Raw SQL shell.
    shell: Arc<dyn SqlShell + Send + Sync>,
    /// Host port allocator.
    ports: PortAllocator,
    /// Tenant pool registry.
    pools: PoolRegistry<F>,
    /// Statement builder.
    statements: StatementBuilder,
    /// Lifecycle observer.
    observer: Arc<dyn LifecycleObserver>,
    /// Usernames with a registration in progress.
    registering: Mutex<BTreeSet<Username>>,
}

impl<F: PoolFactory> TenantService<F> {
    /// Assembles a service from its collaborators.
    #[must_use]
    pub fn new(
        config: TenantServiceConfig,
        registry: SharedRegistryStore,
        runtime: Arc<dyn ContainerRuntime + Send + Sync>,
        shell: Arc<dyn SqlShell + Send + Sync>,
        ports: PortAllocator,
        pools: PoolRegistry<F>,
    ) -> Self {
        let statements = StatementBuilder::new(config.identifier_policy);
        Self {
            config,
            registry,
            runtime,
            shell,
            ports,
            pools,
            statements,
            observer: Arc::new(NoopObserver),
            registering: Mutex::new(BTreeSet::new()),
        }
    }

    /// Replaces the lifecycle observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Creates the registry schema and marks registered ports in use.
    ///
    /// Returns the number of registered tenants.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub fn initialize(&self) -> Result<usize, TenantError> {
        self.registry.init_schema()?;
        let records = self.registry.list()?;
        for record in &records {
            self.ports.mark_in_use(record.container_port);
        }
        Ok(records.len())
    }

    /// Returns the pool registry.
    #[must_use]
    pub const fn pools(&self) -> &PoolRegistry<F> {
        &self.pools
    }

    /// Returns the port allocator.
    #[must_use]
    pub const fn ports(&self) -> &PortAllocator {
        &self.ports
    }

    /// Returns the service settings.
    #[must_use]
    pub const fn config(&self) -> &TenantServiceConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Provisions a container for a new tenant and records it.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for bad input,
    /// [`TenantError::DuplicateUsername`] when the name is taken, and
    /// [`TenantError::CreationFailed`] when a port or container cannot be
    /// provisioned.
    pub fn register(&self, username: &str, password: &str) -> Result<TenantRecord, TenantError> {
        let username = Username::parse(username)?;
        validate_password(password)?;
        let _claim = self.claim(&username)?;
        if self.registry.get(&username)?.is_some() {
            return Err(TenantError::DuplicateUsername(username.to_string()));
        }

        let port = self.ports.allocate().map_err(|err| self.failed(&username, "port", err))?;
        let network = match self.runtime.ensure_network(&self.config.network) {
            Ok(network) => network,
            Err(err) => {
                self.ports.release(port);
                return Err(self.failed(&username, "network", err));
            }
        };
        let spec = ContainerSpec {
            name: ContainerName::for_tenant(&self.config.name_prefix, &username),
            username: username.clone(),
            password: password.to_string(),
            host_port: port,
            network: network.name,
        };
        let container = match self.runtime.create_database_container(&spec) {
            Ok(container) => container,
            Err(err) => {
                self.ports.release(port);
                return Err(self.failed(&username, "container", err));
            }
        };

        let record = TenantRecord {
            username: username.clone(),
            password: password.to_string(),
            container_id: container.handle.id.clone(),
            container_hostname: container.hostname.clone(),
            container_port: container.host_port,
            registered_at: TenantRecord::now(),
        };
        if let Err(err) = self.registry.save(&record) {
            let leftover = format!(
                "{}; container {} ({}) left on port {} for manual cleanup",
                err.detail(),
                container.handle.name,
                container.handle.id,
                container.host_port
            );
            let err = match err {
                TenantError::DuplicateUsername(_) => TenantError::DuplicateUsername(leftover),
                _ => TenantError::QueryFailed(leftover),
            };
            return Err(self.failed(&username, "registry", err));
        }
        self.observer.on_event(&LifecycleEvent::TenantProvisioned {
            username: username.clone(),
            container_id: record.container_id.clone(),
            host_port: record.container_port,
        });

        if self.config.eager_pools {
            let connection = self.config.endpoint.connection_string(&record);
            // Failures are reported to the observer by the pool registry.
            let _ = self.pools.register(&username, &connection);
        }
        Ok(record)
    }

    /// Reserves `username` until the returned claim is dropped.
    fn claim(&self, username: &Username) -> Result<RegistrationClaim<'_>, TenantError> {
        let mut registering = self.registering.lock().unwrap_or_else(PoisonError::into_inner);
        if !registering.insert(username.clone()) {
            return Err(TenantError::DuplicateUsername(format!(
                "{username} (registration in progress)"
            )));
        }
        drop(registering);
        Ok(RegistrationClaim {
            registering: &self.registering,
            username: username.clone(),
        })
    }

    /// Reports a registration failure and passes the error through.
    fn failed(&self, username: &Username, stage: &'static str, error: TenantError) -> TenantError {
        self.observer.on_event(&LifecycleEvent::RegistrationFailed {
            username: username.clone(),
            stage,
            error: error.clone(),
        });
        error
    }

    /// Loads a tenant record.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::NotFound`] for unknown usernames.
    pub fn tenant(&self, username: &str) -> Result<TenantRecord, TenantError> {
        let username = Username::parse(username)?;
        self.registry
            .get(&username)?
            .ok_or_else(|| TenantError::NotFound(format!("tenant {username} is not registered")))
    }

    // ------------------------------------------------------------------------
    // Admin table operations (raw SQL shell)
    // ------------------------------------------------------------------------

    /// Lists tables by scraping the shell's text output.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::NotFound`] or [`TenantError::QueryFailed`].
    pub fn admin_list_tables(&self, username: &str) -> Result<Vec<String>, TenantError> {
        let output = self.run_admin_sql(username, LIST_TABLES_SQL)?;
        Ok(parse_table_listing(&output))
    }

    /// Returns the shell's text rendering of a whole table.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`], [`TenantError::NotFound`], or
    /// [`TenantError::QueryFailed`].
    pub fn admin_read_table(&self, username: &str, table: &str) -> Result<String, TenantError> {
        let sql = self.statements.shell_select_all(table)?;
        self.run_admin_sql(username, &sql)
    }

    /// Runs operator-supplied table creation SQL.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for empty SQL, otherwise shell errors.
    pub fn admin_create_table(&self, username: &str, sql: &str) -> Result<String, TenantError> {
        self.run_operator_sql(username, sql, "table creation")
    }

    /// Runs operator-supplied data update SQL against a table.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for empty SQL, otherwise shell errors.
    pub fn admin_update_table(
        &self,
        username: &str,
        _table: &str,
        sql: &str,
    ) -> Result<String, TenantError> {
        self.run_operator_sql(username, sql, "updating table data")
    }

    /// Runs operator-supplied structure change SQL against a table.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] for empty SQL, otherwise shell errors.
    pub fn admin_modify_structure(
        &self,
        username: &str,
        _table: &str,
        sql: &str,
    ) -> Result<String, TenantError> {
        self.run_operator_sql(username, sql, "modifying table structure")
    }

    /// Drops a table when it exists.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`], [`TenantError::NotFound`], or
    /// [`TenantError::QueryFailed`].
    pub fn admin_drop_table(&self, username: &str, table: &str) -> Result<String, TenantError> {
        let sql = self.statements.shell_drop_table(table)?;
        self.run_admin_sql(username, &sql)
    }

    /// Validates operator SQL and runs it.
    fn run_operator_sql(
        &self,
        username: &str,
        sql: &str,
        purpose: &str,
    ) -> Result<String, TenantError> {
        if sql.trim().is_empty() {
            return Err(TenantError::Validation(format!("SQL query for {purpose} is required")));
        }
        self.run_admin_sql(username, sql)
    }

    /// Locates the tenant container and runs SQL in it.
    fn run_admin_sql(&self, username: &str, sql: &str) -> Result<String, TenantError> {
        let username = Username::parse(username)?;
        let container = self.locate(&username)?;
        self.shell.run(&container, sql, username.as_str(), username.as_str())
    }

    /// Locates the tenant container by deterministic name.
    fn locate(&self, username: &Username) -> Result<ContainerHandle, TenantError> {
        let name = ContainerName::for_tenant(&self.config.name_prefix, username);
        self.runtime.locate_container(&name)
    }

    // ------------------------------------------------------------------------
    // Tenant CRUD (pooled)
    // ------------------------------------------------------------------------

    /// Round-trips `SELECT 1` on the tenant pool.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::NotFound`], pool errors, or query errors.
    pub fn test_connection(&self, username: &str) -> Result<(), TenantError> {
        self.with_gateway(username, |gateway| gateway.test_connection())
    }

    /// Creates a tenant table from a column map.
    ///
    /// # Errors
    ///
    /// Returns gateway errors.
    pub fn create_table(
        &self,
        username: &str,
        table: &str,
        columns: &BTreeMap<String, String>,
    ) -> Result<(), TenantError> {
        self.with_gateway(username, |gateway| gateway.create_table(table, columns))
    }

    /// Inserts a row and returns its `id`.
    ///
    /// # Errors
    ///
    /// Returns gateway errors.
    pub fn insert_item(&self, username: &str, table: &str, row: &Row) -> Result<i64, TenantError> {
        self.with_gateway(username, |gateway| gateway.insert(table, row))
    }

    /// Returns every row of a tenant table.
    ///
    /// # Errors
    ///
    /// Returns gateway errors.
    pub fn get_items(&self, username: &str, table: &str) -> Result<Vec<Row>, TenantError> {
        self.with_gateway(username, |gateway| gateway.get_all(table))
    }

    /// Updates a row by `id`; zero affected rows is success.
    ///
    /// # Errors
    ///
    /// Returns gateway errors.
    pub fn update_item(
        &self,
        username: &str,
        table: &str,
        item_id: i64,
        row: &Row,
    ) -> Result<u64, TenantError> {
        self.with_gateway(username, |gateway| gateway.update(table, item_id, row))
    }

    /// Deletes a row by `id`; zero affected rows is success.
    ///
    /// # Errors
    ///
    /// Returns gateway errors.
    pub fn delete_item(&self, username: &str, table: &str, item_id: i64) -> Result<u64, TenantError> {
        self.with_gateway(username, |gateway| gateway.delete(table, item_id))
    }

    /// Lists tenant tables through the catalog.
    ///
    /// # Errors
    ///
    /// Returns gateway errors.
    pub fn list_tables(&self, username: &str) -> Result<Vec<String>, TenantError> {
        self.with_gateway(username, |gateway| gateway.list_tables())
    }

    /// Resolves the tenant pool and runs `op` on a gateway over it.
    fn with_gateway<T>(
        &self,
        username: &str,
        op: impl FnOnce(&TenantGateway<'_, F::Pool>) -> Result<T, TenantError>,
    ) -> Result<T, TenantError> {
        let record = self.tenant(username)?;
        let connection = self.config.endpoint.connection_string(&record);
        let pool = self.pools.get_or_create_pool(&record.username, &connection)?;
        let gateway = TenantGateway::new(pool.as_ref(), self.statements);
        op(&gateway)
    }
}

/// In-flight reservation of one username.
struct RegistrationClaim<'a> {
    /// Set the username is removed from on drop.
    registering: &'a Mutex<BTreeSet<Username>>,
    /// Reserved username.
    username: Username,
}

impl Drop for RegistrationClaim<'_> {
    fn drop(&mut self) {
        self.registering.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.username);
    }
}

/// Validates a registration password.
fn validate_password(password: &str) -> Result<(), TenantError> {
    if password.is_empty() {
        return Err(TenantError::Validation("password must be non-empty".to_string()));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(TenantError::Validation(format!(
            "password exceeds {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
