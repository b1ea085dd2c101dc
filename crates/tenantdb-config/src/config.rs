// crates/tenantdb-config/src/config.rs
// ============================================================================
// Module: Tenant DB Configuration
// Description: Configuration loading and validation for the Tenant DB service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: tenantdb-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with size and path limits, then
//! environment overrides are applied and the result is validated. Every
//! section has defaults, so an empty file is a valid configuration.
//!
//! The config path comes from the caller, then `TENANTDB_CONFIG`, then
//! `tenantdb.toml` in the working directory. Only the last one may be absent,
//! in which case defaults are used.
//!
//! Environment overrides:
//! - `TENANTDB_REGISTRY_URL` replaces `registry.connection`.
//! - `MAIN_DB_HOST`, `MAIN_DB_NAME`, `MAIN_DB_USER`, `MAIN_DB_PASSWORD`
//!   compose `registry.connection` when all four are set and
//!   `TENANTDB_REGISTRY_URL` is not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tenantdb_core::AddressMode;
use tenantdb_core::IdentifierPolicy;
use tenantdb_core::PortCheck;
use tenantdb_core::PortRange;
use tenantdb_core::TenantEndpoint;
use tenantdb_core::TenantServiceConfig;
use tenantdb_core::quote_conninfo;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "tenantdb.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TENANTDB_CONFIG";
/// Environment variable that replaces the registry connection string.
pub const REGISTRY_URL_ENV_VAR: &str = "TENANTDB_REGISTRY_URL";
/// Registry host variable (`host` or `host:port`).
pub const MAIN_DB_HOST_ENV_VAR: &str = "MAIN_DB_HOST";
/// Registry database name variable.
pub const MAIN_DB_NAME_ENV_VAR: &str = "MAIN_DB_NAME";
/// Registry user variable.
pub const MAIN_DB_USER_ENV_VAR: &str = "MAIN_DB_USER";
/// Registry password variable.
pub const MAIN_DB_PASSWORD_ENV_VAR: &str = "MAIN_DB_PASSWORD";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum request body size accepted by the server.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Maximum registry pool size.
pub(crate) const MAX_REGISTRY_CONNECTIONS: u32 = 256;
/// Maximum pools held by the pool registry.
pub(crate) const MAX_POOL_ENTRIES: usize = 10_000;
/// Maximum connections per tenant pool (`pool_size + max_overflow`).
pub(crate) const MAX_TENANT_CONNECTIONS: u32 = 512;
/// Minimum timeout accepted for any `*_timeout_ms` setting.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum timeout accepted for any `*_timeout_ms` setting.
pub(crate) const MAX_TIMEOUT_MS: u64 = 600_000;
/// Maximum container name prefix length.
pub(crate) const MAX_NAME_PREFIX_LENGTH: usize = 64;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Tenant DB service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDbConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Registry database settings.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Container runtime settings.
    #[serde(default)]
    pub containers: ContainerConfig,
    /// Host port allocation settings.
    #[serde(default)]
    pub ports: PortsConfig,
    /// Tenant pool settings.
    #[serde(default)]
    pub pools: PoolsConfig,
    /// Tenant data gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Audit log settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl TenantDbConfig {
    /// Loads configuration from disk, applies process environment
    /// overrides, and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, required) = resolve_path(path)?;
        validate_path(&resolved)?;
        let mut config = if !required && !resolved.exists() {
            Self::default()
        } else {
            let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
            if bytes.len() > MAX_CONFIG_FILE_SIZE {
                return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
            }
            let content = std::str::from_utf8(&bytes)
                .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
            Self::parse(content)?
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML without applying overrides or validating.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(REGISTRY_URL_ENV_VAR).filter(|url| !url.trim().is_empty()) {
            self.registry.connection = url;
            return;
        }
        let parts = (
            lookup(MAIN_DB_HOST_ENV_VAR),
            lookup(MAIN_DB_NAME_ENV_VAR),
            lookup(MAIN_DB_USER_ENV_VAR),
            lookup(MAIN_DB_PASSWORD_ENV_VAR),
        );
        if let (Some(host), Some(name), Some(user), Some(password)) = parts {
            self.registry.connection = compose_registry_connection(&host, &name, &user, &password);
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.registry.validate()?;
        self.containers.validate()?;
        self.ports.validate()?;
        self.pools.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the tenant service settings derived from this config.
    #[must_use]
    pub fn service_config(&self) -> TenantServiceConfig {
        TenantServiceConfig {
            network: self.containers.network.clone(),
            name_prefix: self.containers.name_prefix.clone(),
            endpoint: self.endpoint(),
            identifier_policy: self.gateway.identifier_policy,
            eager_pools: self.pools.eager_on_register,
        }
    }

    /// Returns the tenant connection endpoint policy.
    #[must_use]
    pub fn endpoint(&self) -> TenantEndpoint {
        TenantEndpoint {
            mode: self.containers.address_mode,
            published_host: self.containers.published_host.clone(),
            internal_port: self.containers.internal_port,
        }
    }

    /// Returns the validated host port range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the range is empty or privileged.
    pub fn port_range(&self) -> Result<PortRange, ConfigError> {
        self.ports.range()
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address is malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is invalid: {}", self.bind)))
    }

    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid("server.max_body_bytes out of range".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry database settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// `PostgreSQL` connection string (URL or key/value form).
    #[serde(default = "default_registry_connection")]
    pub connection: String,
    /// Registry pool size.
    #[serde(default = "default_registry_max_connections")]
    pub max_connections: u32,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Statement timeout in milliseconds.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            connection: default_registry_connection(),
            max_connections: default_registry_max_connections(),
            connect_timeout_ms: default_connect_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("connection", &redact_connection(&self.connection))
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("statement_timeout_ms", &self.statement_timeout_ms)
            .finish()
    }
}

impl RegistryConfig {
    /// Returns the connection string with any password masked.
    #[must_use]
    pub fn redacted_connection(&self) -> String {
        redact_connection(&self.connection)
    }

    /// Validates registry settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.trim().is_empty() {
            return Err(ConfigError::Invalid("registry.connection must be set".to_string()));
        }
        if self.max_connections == 0 || self.max_connections > MAX_REGISTRY_CONNECTIONS {
            return Err(ConfigError::Invalid("registry.max_connections out of range".to_string()));
        }
        validate_timeout("registry.connect_timeout_ms", self.connect_timeout_ms)?;
        validate_timeout("registry.statement_timeout_ms", self.statement_timeout_ms)
    }
}

// ============================================================================
// SECTION: Containers
// ============================================================================

/// Container runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Docker CLI binary.
    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,
    /// Database image launched per tenant.
    #[serde(default = "default_image")]
    pub image: String,
    /// Shared bridge network.
    #[serde(default = "default_network")]
    pub network: String,
    /// Container name prefix.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    /// Database port inside the container.
    #[serde(default = "default_internal_port")]
    pub internal_port: u16,
    /// Timeout for each Docker CLI call in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// How the service reaches tenant databases.
    #[serde(default)]
    pub address_mode: AddressMode,
    /// Host used when `address_mode = "published"`.
    #[serde(default = "default_published_host")]
    pub published_host: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            docker_binary: default_docker_binary(),
            image: default_image(),
            network: default_network(),
            name_prefix: default_name_prefix(),
            internal_port: default_internal_port(),
            command_timeout_ms: default_command_timeout_ms(),
            address_mode: AddressMode::default(),
            published_host: default_published_host(),
        }
    }
}

impl ContainerConfig {
    /// Validates container settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("containers.docker_binary", &self.docker_binary)?;
        if self.image.trim().is_empty() {
            return Err(ConfigError::Invalid("containers.image must be set".to_string()));
        }
        validate_docker_name("containers.network", &self.network)?;
        validate_docker_name("containers.name_prefix", &self.name_prefix)?;
        if self.name_prefix.len() > MAX_NAME_PREFIX_LENGTH {
            return Err(ConfigError::Invalid("containers.name_prefix too long".to_string()));
        }
        if self.internal_port == 0 {
            return Err(ConfigError::Invalid("containers.internal_port must be nonzero".to_string()));
        }
        if self.address_mode == AddressMode::Published && self.published_host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "containers.published_host is required for published address mode".to_string(),
            ));
        }
        validate_timeout("containers.command_timeout_ms", self.command_timeout_ms)
    }
}

// ============================================================================
// SECTION: Ports
// ============================================================================

/// Host port allocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortsConfig {
    /// First port in the allocation range.
    #[serde(default = "default_range_start")]
    pub range_start: u16,
    /// Last port in the allocation range.
    #[serde(default = "default_range_end")]
    pub range_end: u16,
    /// Liveness check for candidate ports.
    #[serde(default)]
    pub check: PortCheck,
    /// Attempts per allocation before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            range_start: default_range_start(),
            range_end: default_range_end(),
            check: PortCheck::default(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PortsConfig {
    /// Returns the validated range.
    fn range(&self) -> Result<PortRange, ConfigError> {
        PortRange::new(self.range_start, self.range_end)
            .map_err(|err| ConfigError::Invalid(format!("ports: {}", err.detail())))
    }

    /// Validates port settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.range()?;
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("ports.max_attempts must be nonzero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Pools
// ============================================================================

/// Tenant pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolsConfig {
    /// Maximum pools held before least recently used eviction.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Idle connections kept per pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Extra connections allowed above `pool_size`.
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,
    /// Wait for a free connection before `pool_exhausted`, in milliseconds.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Bound on pool construction and its liveness check, in milliseconds.
    #[serde(default = "default_creation_timeout_ms")]
    pub creation_timeout_ms: u64,
    /// Build the tenant pool during registration.
    #[serde(default)]
    pub eager_on_register: bool,
}

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            pool_size: default_pool_size(),
            max_overflow: default_max_overflow(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            creation_timeout_ms: default_creation_timeout_ms(),
            eager_on_register: false,
        }
    }
}

impl PoolsConfig {
    /// Maximum connections per tenant pool.
    #[must_use]
    pub const fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }

    /// Validates pool settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 || self.max_entries > MAX_POOL_ENTRIES {
            return Err(ConfigError::Invalid("pools.max_entries out of range".to_string()));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pools.pool_size must be nonzero".to_string()));
        }
        if self.max_connections() > MAX_TENANT_CONNECTIONS {
            return Err(ConfigError::Invalid(
                "pools.pool_size + pools.max_overflow exceeds limit".to_string(),
            ));
        }
        validate_timeout("pools.acquire_timeout_ms", self.acquire_timeout_ms)?;
        validate_timeout("pools.creation_timeout_ms", self.creation_timeout_ms)
    }
}

// ============================================================================
// SECTION: Gateway / Audit
// ============================================================================

/// Tenant data gateway settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Identifier handling. `passthrough` interpolates names unchanged and
    /// is vulnerable to SQL injection.
    #[serde(default)]
    pub identifier_policy: IdentifierPolicy,
}

/// Audit log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit events.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional JSONL file; stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and whether it must exist.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a Docker object name fragment (`[A-Za-z0-9_.-]`, non-empty).
fn validate_docker_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if !value.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')) {
        return Err(ConfigError::Invalid(format!("{field} has invalid characters")));
    }
    Ok(())
}

/// Validates a timeout against global bounds.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Builds a key/value connection string from `MAIN_DB_*` parts.
fn compose_registry_connection(host: &str, name: &str, user: &str, password: &str) -> String {
    let (host, port) = match host.rsplit_once(':') {
        Some((host, port)) if port.parse::<u16>().is_ok() => (host, Some(port)),
        _ => (host, None),
    };
    let mut parts = vec![format!("host={}", quote_conninfo(host))];
    if let Some(port) = port {
        parts.push(format!("port={port}"));
    }
    parts.push(format!("user={}", quote_conninfo(user)));
    parts.push(format!("password={}", quote_conninfo(password)));
    parts.push(format!("dbname={}", quote_conninfo(name)));
    parts.join(" ")
}

/// Masks passwords in URL or key/value connection strings.
fn redact_connection(connection: &str) -> String {
    if let Some((scheme, rest)) = connection.split_once("://") {
        if let Some((userinfo, host)) = rest.split_once('@')
            && let Some((user, _)) = userinfo.split_once(':')
        {
            return format!("{scheme}://{user}:***@{host}");
        }
        return connection.to_string();
    }
    let mut redacted = Vec::new();
    let mut skipping = false;
    for token in connection.split_whitespace() {
        if skipping {
            skipping = !token.ends_with('\'') || token.ends_with("\\'");
            continue;
        }
        if let Some(value) = token.strip_prefix("password=") {
            redacted.push("password=***".to_string());
            skipping = value.starts_with('\'') && (value.len() == 1 || !value.ends_with('\''));
            continue;
        }
        redacted.push(token.to_string());
    }
    redacted.join(" ")
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bind address.
fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

/// Default maximum request body size.
pub(crate) const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default registry connection string.
fn default_registry_connection() -> String {
    "host=localhost port=5432 user=postgres dbname=tenantdb".to_string()
}

/// Default registry pool size.
const fn default_registry_max_connections() -> u32 {
    8
}

/// Default registry connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Default registry statement timeout.
const fn default_statement_timeout_ms() -> u64 {
    10_000
}

/// Default Docker CLI binary.
fn default_docker_binary() -> String {
    "docker".to_string()
}

/// Default tenant database image.
fn default_image() -> String {
    "custom-postgres".to_string()
}

/// Default shared network.
fn default_network() -> String {
    "docker_mynetwork".to_string()
}

/// Default container name prefix.
fn default_name_prefix() -> String {
    "postgres_".to_string()
}

/// Default database port inside containers.
const fn default_internal_port() -> u16 {
    5432
}

/// Default Docker CLI timeout.
const fn default_command_timeout_ms() -> u64 {
    60_000
}

/// Default published host.
fn default_published_host() -> String {
    "127.0.0.1".to_string()
}

/// Default first port.
const fn default_range_start() -> u16 {
    49_152
}

/// Default last port.
const fn default_range_end() -> u16 {
    65_535
}

/// Default allocation attempts.
const fn default_max_attempts() -> u32 {
    tenantdb_core::DEFAULT_MAX_ATTEMPTS
}

/// Default pool registry capacity.
const fn default_max_entries() -> usize {
    100
}

/// Default idle connections per pool.
const fn default_pool_size() -> u32 {
    10
}

/// Default overflow connections per pool.
const fn default_max_overflow() -> u32 {
    20
}

/// Default connection acquisition timeout.
const fn default_acquire_timeout_ms() -> u64 {
    30_000
}

/// Default pool creation timeout.
const fn default_creation_timeout_ms() -> u64 {
    5_000
}

/// Default audit enabled.
const fn default_audit_enabled() -> bool {
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================
