// crates/tenantdb-docker/src/lib.rs
// ============================================================================
// Module: Tenant DB Docker Runtime
// Description: Docker CLI backed container lifecycle and SQL shell.
// Purpose: Launch, locate, and exec into tenant database containers.
// Dependencies: tenantdb-core, thiserror
// ============================================================================

//! ## Overview
//! [`DockerCli`] implements the container lifecycle contract and the raw SQL
//! shell by invoking the `docker` binary. Every invocation goes through a
//! [`CommandRunner`] with an enforced timeout; [`ProcessRunner`] is the real
//! one and tests substitute a scripted runner.

pub mod command;
pub mod docker;

pub use command::CommandError;
pub use command::CommandOutput;
pub use command::CommandRunner;
pub use command::Invocation;
pub use command::ProcessRunner;
pub use docker::DockerCli;
pub use docker::DockerCliConfig;
