// crates/tenantdb-server/src/server.rs
// ============================================================================
// Module: Tenant DB Server
// Description: Wires configuration into the tenant service and serves HTTP.
// Purpose: Assemble registry, Docker runtime, ports, pools, and audit sinks.
// Dependencies: tenantdb-config, tenantdb-core, tenantdb-docker,
//               tenantdb-store-postgres, axum, tokio
// ============================================================================

//! ## Overview
//! [`TenantDbServer::from_config`] validates configuration and builds every
//! collaborator without touching the network: the registry pool connects
//! lazily and Docker is only invoked on registration. [`TenantDbServer::serve`]
//! creates the registry schema, marks registered ports in use, then accepts
//! HTTP connections.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tenantdb_config::AuditConfig;
use tenantdb_config::TenantDbConfig;
use tenantdb_core::ContainerRuntime;
use tenantdb_core::LifecycleObserver;
use tenantdb_core::PoolRegistry;
use tenantdb_core::PortAllocator;
use tenantdb_core::SqlShell;
use tenantdb_core::TenantService;
use tenantdb_docker::DockerCli;
use tenantdb_docker::DockerCliConfig;
use tenantdb_store_postgres::PostgresPoolFactory;
use tenantdb_store_postgres::PostgresRegistryConfig;
use tenantdb_store_postgres::TenantPoolSettings;
use tenantdb_store_postgres::shared_postgres_registry;

use crate::audit::AuditObserver;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::audit::TenantAuditSink;
use crate::error::ServerError;
use crate::routes::AppState;
use crate::routes::router;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Tenant service backed by `PostgreSQL` pools.
pub type PostgresTenantService = TenantService<PostgresPoolFactory>;

/// Tenant DB HTTP server.
pub struct TenantDbServer {
    /// Validated configuration.
    config: TenantDbConfig,
    /// Tenant service shared with handlers.
    service: Arc<PostgresTenantService>,
    /// Request audit sink.
    audit: Arc<dyn TenantAuditSink>,
}

impl TenantDbServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] for invalid configuration and
    /// [`ServerError::Init`] when the registry or audit sink cannot be built.
    pub fn from_config(config: TenantDbConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(&config.audit)?;
        let observer: Arc<dyn LifecycleObserver> = Arc::new(AuditObserver::new(Arc::clone(&audit)));

        let registry = shared_postgres_registry(&registry_config(&config))
            .map_err(|err| ServerError::Init(err.to_string()))?;
        let docker = Arc::new(DockerCli::new(docker_config(&config)));
        let runtime: Arc<dyn ContainerRuntime + Send + Sync> = docker.clone();
        let shell: Arc<dyn SqlShell + Send + Sync> = docker;
        let ports = PortAllocator::new(
            config.port_range().map_err(|err| ServerError::Config(err.to_string()))?,
            config.ports.check,
            config.ports.max_attempts,
        );
        let pools = PoolRegistry::new(
            PostgresPoolFactory::new(pool_settings(&config)),
            config.pools.max_entries,
        )
        .with_observer(Arc::clone(&observer));
        let service =
            TenantService::new(config.service_config(), registry, runtime, shell, ports, pools)
                .with_observer(observer);
        Ok(Self {
            config,
            service: Arc::new(service),
            audit,
        })
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &TenantDbConfig {
        &self.config
    }

    /// Returns the tenant service.
    #[must_use]
    pub fn service(&self) -> Arc<PostgresTenantService> {
        Arc::clone(&self.service)
    }

    /// Creates the registry schema and reserves registered ports.
    ///
    /// Returns the number of registered tenants. Blocks on the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Init`] when the registry is unreachable.
    pub fn initialize(&self) -> Result<usize, ServerError> {
        self.service.initialize().map_err(|err| ServerError::Init(err.to_string()))
    }

    /// Builds the HTTP router.
    #[must_use]
    pub fn router(&self) -> Router {
        router(
            AppState {
                service: Arc::clone(&self.service),
                audit: Arc::clone(&self.audit),
            },
            self.config.server.max_body_bytes,
        )
    }

    /// Initializes the registry and serves HTTP until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when initialization, bind, or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr: SocketAddr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || service.initialize())
            .await
            .map_err(|err| ServerError::Init(format!("registry initialization aborted: {err}")))?
            .map_err(|err| ServerError::Init(err.to_string()))?;
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed on {addr}: {err}")))?;
        axum::serve(listener, app)
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Registry store settings from configuration.
fn registry_config(config: &TenantDbConfig) -> PostgresRegistryConfig {
    PostgresRegistryConfig {
        connection: config.registry.connection.clone(),
        max_connections: config.registry.max_connections,
        connect_timeout_ms: config.registry.connect_timeout_ms,
        statement_timeout_ms: config.registry.statement_timeout_ms,
    }
}

/// Docker CLI settings from configuration.
fn docker_config(config: &TenantDbConfig) -> DockerCliConfig {
    DockerCliConfig {
        binary: config.containers.docker_binary.clone(),
        image: config.containers.image.clone(),
        internal_port: config.containers.internal_port,
        command_timeout: Duration::from_millis(config.containers.command_timeout_ms),
    }
}

/// Tenant pool settings from configuration.
fn pool_settings(config: &TenantDbConfig) -> TenantPoolSettings {
    TenantPoolSettings {
        pool_size: config.pools.pool_size,
        max_overflow: config.pools.max_overflow,
        acquire_timeout: Duration::from_millis(config.pools.acquire_timeout_ms),
        creation_timeout: Duration::from_millis(config.pools.creation_timeout_ms),
    }
}

/// Selects the audit sink: disabled, file-backed, or stderr.
fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn TenantAuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Unit tests use unwrap on deterministic fixtures."
    )]

    use tenantdb_config::TenantDbConfig;

    use super::TenantDbServer;
    use super::docker_config;
    use super::pool_settings;
    use crate::error::ServerError;

    #[test]
    fn builds_without_touching_the_network() {
        let server = TenantDbServer::from_config(TenantDbConfig::default()).unwrap();
        assert!(server.service().pools().is_empty());
        assert_eq!(server.config().server.max_body_bytes, TenantDbConfig::default().server.max_body_bytes);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = TenantDbConfig::default();
        config.ports.range_start = 60_000;
        config.ports.range_end = 50_000;
        assert!(matches!(TenantDbServer::from_config(config), Err(ServerError::Config(_))));
    }

    #[test]
    fn unwritable_audit_path_is_init_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TenantDbConfig::default();
        config.audit.path = Some(dir.path().join("missing").join("audit.jsonl").display().to_string());
        assert!(matches!(TenantDbServer::from_config(config), Err(ServerError::Init(_))));
    }

    #[test]
    fn millisecond_settings_become_durations() {
        let mut config = TenantDbConfig::default();
        config.containers.command_timeout_ms = 1_500;
        config.pools.acquire_timeout_ms = 250;
        assert_eq!(docker_config(&config).command_timeout.as_millis(), 1_500);
        assert_eq!(pool_settings(&config).acquire_timeout.as_millis(), 250);
    }
}
