// system-tests/tests/helpers/infra.rs
// ============================================================================
// Module: System Test Infrastructure
// Description: PostgreSQL fixture for registry and tenant pool system-tests.
// Purpose: Provide an isolated database reachable from the test process.
// Dependencies: testcontainers, postgres
// ============================================================================

//! ## Overview
//! [`PostgresFixture::start`] uses `TENANTDB_SYSTEM_PG_URL` when set and
//! otherwise starts a `PostgreSQL` container. The fixture waits until the
//! database accepts TCP connections; the container is removed on drop.

use std::thread;
use std::time::Duration;
use std::time::Instant;

use postgres::Client;
use postgres::NoTls;
use system_tests::config::SystemTestConfig;
use testcontainers::Container;
use testcontainers::GenericImage;
use testcontainers::ImageExt;
use testcontainers::core::IntoContainerPort;
use testcontainers::core::WaitFor;
use testcontainers::runners::SyncRunner;

/// Credentials baked into the fixture container.
const FIXTURE_USER: &str = "tenantdb";
/// Fixture superuser password.
const FIXTURE_PASSWORD: &str = "tenantdb";
/// Fixture database name.
const FIXTURE_DB: &str = "tenantdb";

/// Running database for one test.
pub struct PostgresFixture {
    /// Connection string accepted by `postgres::Config`.
    pub connection: String,
    /// Container kept alive for the fixture lifetime.
    _container: Option<Container<GenericImage>>,
}

impl PostgresFixture {
    /// Starts or attaches to the test database.
    pub fn start() -> Result<Self, String> {
        let config = SystemTestConfig::load()?;
        if let Some(connection) = config.postgres_url {
            wait_until_ready(&connection, config.ready_timeout)?;
            return Ok(Self {
                connection,
                _container: None,
            });
        }

        ensure_docker_available()?;
        let container = GenericImage::new(config.image_name, config.image_tag)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr("database system is ready to accept connections"))
            .with_env_var("POSTGRES_USER", FIXTURE_USER)
            .with_env_var("POSTGRES_PASSWORD", FIXTURE_PASSWORD)
            .with_env_var("POSTGRES_DB", FIXTURE_DB)
            .start()
            .map_err(|err| format!("failed to start postgres container: {err}"))?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .map_err(|err| format!("failed to resolve postgres port: {err}"))?;
        let connection = format!(
            "host=127.0.0.1 port={port} user={FIXTURE_USER} password={FIXTURE_PASSWORD} \
             dbname={FIXTURE_DB}"
        );
        wait_until_ready(&connection, config.ready_timeout)?;
        Ok(Self {
            connection,
            _container: Some(container),
        })
    }

    /// Opens a direct client for assertions outside the code under test.
    pub fn client(&self) -> Result<Client, String> {
        Client::connect(&self.connection, NoTls).map_err(|err| format!("connect failed: {err}"))
    }
}

/// Polls until a plain connection succeeds.
fn wait_until_ready(connection: &str, timeout: Duration) -> Result<(), String> {
    let deadline = Instant::now() + timeout;
    loop {
        let attempt = Client::connect(connection, NoTls)
            .and_then(|mut client| client.simple_query("SELECT 1").map(|_| ()));
        match attempt {
            Ok(()) => return Ok(()),
            Err(err) if Instant::now() >= deadline => {
                return Err(format!("postgres not ready after {}s: {err}", timeout.as_secs()));
            }
            Err(_) => thread::sleep(Duration::from_millis(250)),
        }
    }
}

/// Fails early with a readable message when the Docker daemon is missing.
fn ensure_docker_available() -> Result<(), String> {
    let output = std::process::Command::new("docker")
        .arg("info")
        .output()
        .map_err(|err| format!("docker info failed: {err}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("docker info failed: {stderr}"));
    }
    Ok(())
}
