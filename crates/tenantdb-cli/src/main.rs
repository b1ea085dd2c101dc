// crates/tenantdb-cli/src/main.rs
// ============================================================================
// Module: Tenant DB CLI Entry Point
// Description: Command dispatcher for the Tenant DB server and its config.
// Purpose: Start the HTTP server, prepare the registry, and check config files.
// Dependencies: clap, tenantdb-config, tenantdb-server, thiserror, tokio
// ============================================================================

//! ## Overview
//! `tenantdb serve` loads configuration, creates the registry schema, and
//! serves HTTP. `tenantdb init-registry` only creates the schema.
//! `tenantdb config check` validates a config file and `tenantdb config
//! example` prints a complete example with the default values.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tenantdb_config::TenantDbConfig;
use tenantdb_config::config_toml_example;
use tenantdb_server::TenantDbServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tenantdb", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve(ConfigArgs),
    /// Create the registry schema and report registered tenants.
    InitRegistry(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config file selection shared by subcommands.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Config file path (defaults to `TENANTDB_CONFIG`, then tenantdb.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    #[command(alias = "validate")]
    Check(ConfigArgs),
    /// Print an example config file.
    Example,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failures.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(String),
    /// Server construction, initialization, or serving failed.
    #[error("server error: {0}")]
    Server(String),
    /// Writing to stdout or stderr failed.
    #[error("output error: {0}")]
    Output(String),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point.
#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    if cli.show_version {
        write_line(&mut stdout, &format!("tenantdb {}", env!("CARGO_PKG_VERSION")))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        write_line(&mut stdout, "usage: tenantdb <serve|init-registry|config> [--config PATH]")?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::InitRegistry(args) => command_init_registry(args, &mut stdout).await,
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Check(args) => command_config_check(args.config.as_deref(), &mut stdout),
            ConfigCommand::Example => command_config_example(&mut stdout),
        },
    }
}

// ============================================================================
// SECTION: Server Commands
// ============================================================================

/// Loads configuration and builds the server off the async workers.
async fn build_server(path: Option<PathBuf>) -> CliResult<TenantDbServer> {
    let config = load_config(path.as_deref())?;
    tokio::task::spawn_blocking(move || TenantDbServer::from_config(config))
        .await
        .map_err(|err| CliError::Server(format!("init join failed: {err}")))?
        .map_err(|err| CliError::Server(err.to_string()))
}

/// Executes the `serve` command.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let server = build_server(args.config).await?;
    let mut stderr = std::io::stderr();
    write_line(
        &mut stderr,
        &format!(
            "tenantdb: serving on {} (registry {})",
            server.config().server.bind,
            server.config().registry.redacted_connection()
        ),
    )?;
    server.serve().await.map_err(|err| CliError::Server(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `init-registry` command.
async fn command_init_registry(args: ConfigArgs, out: &mut impl Write) -> CliResult<ExitCode> {
    let server = build_server(args.config).await?;
    let count = tokio::task::spawn_blocking(move || server.initialize())
        .await
        .map_err(|err| CliError::Server(format!("init join failed: {err}")))?
        .map_err(|err| CliError::Server(err.to_string()))?;
    write_line(out, &format!("registry ready: {count} registered tenant(s)"))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Loads configuration from a file, `TENANTDB_CONFIG`, or defaults.
fn load_config(path: Option<&Path>) -> CliResult<TenantDbConfig> {
    TenantDbConfig::load(path).map_err(|err| CliError::Config(err.to_string()))
}

/// Executes `config check`.
fn command_config_check(path: Option<&Path>, out: &mut impl Write) -> CliResult<ExitCode> {
    let config = load_config(path)?;
    write_line(out, "config ok")?;
    write_line(out, &format!("  bind: {}", config.server.bind))?;
    write_line(out, &format!("  registry: {}", config.registry.redacted_connection()))?;
    write_line(
        out,
        &format!("  ports: {}-{}", config.ports.range_start, config.ports.range_end),
    )?;
    write_line(out, &format!("  pool cache entries: {}", config.pools.max_entries))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config example`.
fn command_config_example(out: &mut impl Write) -> CliResult<ExitCode> {
    out.write_all(config_toml_example().as_bytes())
        .map_err(|err| CliError::Output(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes one line to `out`.
fn write_line(out: &mut impl Write, message: &str) -> CliResult<()> {
    writeln!(out, "{message}").map_err(|err| CliError::Output(err.to_string()))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "tenantdb: {message}");
    ExitCode::FAILURE
}
