// crates/tenantdb-docker/src/docker.rs
// ============================================================================
// Module: Docker CLI Runtime
// Description: Container lifecycle and psql exec via the Docker CLI.
// Purpose: Back the ContainerRuntime and SqlShell contracts with `docker`.
// Dependencies: tenantdb-core, crate::command
// ============================================================================

//! ## Overview
//! Tenant containers run the configured image detached, named
//! `{prefix}{username}`, with `POSTGRES_USER` and `POSTGRES_DB` set to the
//! username and the database port published on the allocated host port.
//! The password reaches the container through the CLI's environment
//! (`-e POSTGRES_PASSWORD` without a value), so it never appears in argv.
//!
//! Network creation races with concurrent registrations: when `create` fails
//! because the network already exists, the network is inspected again. There
//! is no retry and no rollback; a network created before a failed launch
//! stays in place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use tenantdb_core::ContainerHandle;
use tenantdb_core::ContainerName;
use tenantdb_core::ContainerRuntime;
use tenantdb_core::ContainerSpec;
use tenantdb_core::NetworkHandle;
use tenantdb_core::ProvisionedContainer;
use tenantdb_core::SqlShell;
use tenantdb_core::TenantError;

use crate::command::CommandOutput;
use crate::command::CommandRunner;
use crate::command::Invocation;
use crate::command::ProcessRunner;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Docker CLI settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCliConfig {
    /// Docker binary name or path.
    pub binary: String,
    /// Tenant database image.
    pub image: String,
    /// Database port inside the container.
    pub internal_port: u16,
    /// Limit for each CLI call.
    pub command_timeout: Duration,
}

impl Default for DockerCliConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            image: "custom-postgres".to_string(),
            internal_port: 5432,
            command_timeout: Duration::from_secs(60),
        }
    }
}

// ============================================================================
// SECTION: Runtime
// ============================================================================

/// Docker CLI implementation of [`ContainerRuntime`] and [`SqlShell`].
#[derive(Debug, Clone, Default)]
pub struct DockerCli<R = ProcessRunner> {
    /// CLI settings.
    config: DockerCliConfig,
    /// Command executor.
    runner: R,
}

impl DockerCli<ProcessRunner> {
    /// Creates a runtime that spawns real `docker` processes.
    #[must_use]
    pub const fn new(config: DockerCliConfig) -> Self {
        Self {
            config,
            runner: ProcessRunner,
        }
    }
}

impl<R: CommandRunner> DockerCli<R> {
    /// Creates a runtime with a custom command runner.
    #[must_use]
    pub const fn with_runner(config: DockerCliConfig, runner: R) -> Self {
        Self {
            config,
            runner,
        }
    }

    /// Returns the CLI settings.
    #[must_use]
    pub const fn config(&self) -> &DockerCliConfig {
        &self.config
    }

    /// Builds an invocation of the docker binary.
    fn invocation(&self, args: &[&str]) -> Invocation {
        Invocation::new(
            &self.config.binary,
            args.iter().map(ToString::to_string).collect(),
            self.config.command_timeout,
        )
    }

    /// Runs a docker command, mapping start and timeout failures with `fail`.
    fn exec(
        &self,
        invocation: &Invocation,
        fail: fn(String) -> TenantError,
    ) -> Result<CommandOutput, TenantError> {
        self.runner.run(invocation).map_err(|err| {
            let action = invocation.args.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
            fail(format!("docker {action}: {err}"))
        })
    }

    /// Inspects a network and returns its id when it exists.
    fn inspect_network(&self, name: &str) -> Result<Option<String>, TenantError> {
        let output = self.exec(
            &self.invocation(&["network", "inspect", "--format", "{{.Id}}", name]),
            TenantError::CreationFailed,
        )?;
        Ok(output.success.then(|| first_line(&output.stdout)))
    }

    /// Builds the `docker run` argv for a tenant container.
    #[must_use]
    pub fn run_args(&self, spec: &ContainerSpec) -> Vec<String> {
        let username = spec.username.as_str();
        vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            spec.name.to_string(),
            "-e".to_string(),
            format!("POSTGRES_USER={username}"),
            "-e".to_string(),
            "POSTGRES_PASSWORD".to_string(),
            "-e".to_string(),
            format!("POSTGRES_DB={username}"),
            "-p".to_string(),
            format!("{}:{}/tcp", spec.host_port, self.config.internal_port),
            "--network".to_string(),
            spec.network.clone(),
            self.config.image.clone(),
        ]
    }
}

impl<R: CommandRunner> ContainerRuntime for DockerCli<R> {
    fn ensure_network(&self, name: &str) -> Result<NetworkHandle, TenantError> {
        if let Some(id) = self.inspect_network(name)? {
            return Ok(NetworkHandle {
                id,
                name: name.to_string(),
                created: false,
            });
        }
        let output = self.exec(
            &self.invocation(&["network", "create", "--driver", "bridge", name]),
            TenantError::CreationFailed,
        )?;
        if output.success {
            return Ok(NetworkHandle {
                id: first_line(&output.stdout),
                name: name.to_string(),
                created: true,
            });
        }
        if output.diagnostic().contains("already exists")
            && let Some(id) = self.inspect_network(name)?
        {
            return Ok(NetworkHandle {
                id,
                name: name.to_string(),
                created: false,
            });
        }
        Err(TenantError::CreationFailed(format!(
            "network {name} could not be created: {}",
            output.diagnostic()
        )))
    }

    fn create_database_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ProvisionedContainer, TenantError> {
        let invocation = Invocation::new(
            &self.config.binary,
            self.run_args(spec),
            self.config.command_timeout,
        )
        .env("POSTGRES_PASSWORD", &spec.password);
        let output = self.exec(&invocation, TenantError::CreationFailed)?;
        if !output.success {
            return Err(TenantError::CreationFailed(format!(
                "container {} failed to start: {}",
                spec.name,
                output.diagnostic()
            )));
        }
        let id = last_line(&output.stdout);
        if id.is_empty() {
            return Err(TenantError::CreationFailed(format!(
                "container {} started without an id",
                spec.name
            )));
        }
        Ok(ProvisionedContainer {
            handle: ContainerHandle {
                id,
                name: spec.name.clone(),
            },
            hostname: spec.name.to_string(),
            host_port: spec.host_port,
        })
    }

    fn locate_container(&self, name: &ContainerName) -> Result<ContainerHandle, TenantError> {
        let output = self.exec(
            &self.invocation(&["container", "inspect", "--format", "{{.Id}}", name.as_str()]),
            TenantError::CreationFailed,
        )?;
        if output.success {
            return Ok(ContainerHandle {
                id: first_line(&output.stdout),
                name: name.clone(),
            });
        }
        let diagnostic = output.diagnostic();
        if diagnostic.contains("No such") || diagnostic.contains("not found") {
            return Err(TenantError::NotFound(format!("container {name} not found")));
        }
        Err(TenantError::CreationFailed(format!("container {name} inspect failed: {diagnostic}")))
    }
}

impl<R: CommandRunner> SqlShell for DockerCli<R> {
    fn run(
        &self,
        container: &ContainerHandle,
        sql: &str,
        db_user: &str,
        db_name: &str,
    ) -> Result<String, TenantError> {
        let output = self.exec(
            &self.invocation(&[
                "exec",
                container.name.as_str(),
                "psql",
                "-U",
                db_user,
                "-d",
                db_name,
                "-c",
                sql,
            ]),
            TenantError::QueryFailed,
        )?;
        if output.success {
            return Ok(output.stdout);
        }
        Err(TenantError::QueryFailed(output.diagnostic().to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// First non-empty trimmed line of CLI output.
fn first_line(output: &str) -> String {
    output.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or_default().to_string()
}

/// Last non-empty trimmed line of CLI output.
fn last_line(output: &str) -> String {
    output.lines().map(str::trim).rfind(|line| !line.is_empty()).unwrap_or_default().to_string()
}
