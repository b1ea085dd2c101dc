// crates/tenantdb-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the `config example` command.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `tenantdb.toml`. Every value matches the built-in
//! default except where a comment shows an alternative.

/// Returns a canonical example `tenantdb.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "0.0.0.0:8000"
max_body_bytes = 1048576

[registry]
connection = "host=localhost port=5432 user=postgres dbname=tenantdb"
max_connections = 8
connect_timeout_ms = 5000
statement_timeout_ms = 10000

[containers]
docker_binary = "docker"
image = "custom-postgres"
network = "docker_mynetwork"
name_prefix = "postgres_"
internal_port = 5432
command_timeout_ms = 60000
# "network" reaches tenants by container name on the shared network.
# "published" reaches them through published_host and the host port.
address_mode = "network"
published_host = "127.0.0.1"

[ports]
range_start = 49152
range_end = 65535
# "unchecked" skips the OS bind check.
check = "bind"
max_attempts = 256

[pools]
max_entries = 100
pool_size = 10
max_overflow = 20
acquire_timeout_ms = 30000
creation_timeout_ms = 5000
eager_on_register = false

[gateway]
# "passthrough" interpolates table and column names unchanged.
# It is open to SQL injection and exists only for legacy clients.
identifier_policy = "strict"

[audit]
enabled = true
# path = "tenantdb-audit.jsonl"
"#,
    )
}
