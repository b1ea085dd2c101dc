// crates/tenantdb-core/src/core/record.rs
// ============================================================================
// Module: Tenant Records
// Description: Registry records and tenant connection endpoints.
// Purpose: Describe what was provisioned for a tenant and how to reach it.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A [`TenantRecord`] is written once at registration and never mutated. The
//! connection string used by the pool registry is derived from it through a
//! [`TenantEndpoint`], so pools can be rebuilt after a restart without any
//! extra persisted state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::core::error::TenantError;
use crate::core::identifiers::Username;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registry timestamp layout (`YYYY-MM-DD HH:MM:SS`, UTC).
const REGISTRATION_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

// ============================================================================
// SECTION: Tenant Record
// ============================================================================

/// Provisioning metadata persisted in the registry.
#[derive(Clone, PartialEq, Eq)]
pub struct TenantRecord {
    /// Unique tenant username.
    pub username: Username,
    /// Database superuser password baked into the container.
    pub password: String,
    /// Container identifier reported by the runtime.
    pub container_id: String,
    /// Container hostname on the shared network.
    pub container_hostname: String,
    /// Host port bound to the container's database port.
    pub container_port: u16,
    /// Registration time (UTC, second precision).
    pub registered_at: OffsetDateTime,
}

impl TenantRecord {
    /// Returns the registration time formatted for the registry table.
    #[must_use]
    pub fn registration_time(&self) -> String {
        self.registered_at.format(REGISTRATION_TIME_FORMAT).unwrap_or_default()
    }

    /// Parses a registry timestamp back into UTC.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::QueryFailed`] when the value is malformed.
    pub fn parse_registration_time(value: &str) -> Result<OffsetDateTime, TenantError> {
        PrimitiveDateTime::parse(value, REGISTRATION_TIME_FORMAT)
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|err| TenantError::QueryFailed(format!("invalid registration_time: {err}")))
    }

    /// Returns the current UTC time truncated to whole seconds.
    #[must_use]
    pub fn now() -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        now.replace_nanosecond(0).unwrap_or(now)
    }
}

impl fmt::Debug for TenantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantRecord")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("container_id", &self.container_id)
            .field("container_hostname", &self.container_hostname)
            .field("container_port", &self.container_port)
            .field("registered_at", &self.registered_at)
            .finish()
    }
}

// ============================================================================
// SECTION: Tenant Endpoint
// ============================================================================

/// How the service reaches tenant databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    /// Connect to `container_hostname:internal_port` over the shared network.
    #[default]
    Network,
    /// Connect to `published_host:container_port` through the host binding.
    Published,
}

/// Connection endpoint policy for tenant databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantEndpoint {
    /// Address mode.
    pub mode: AddressMode,
    /// Host used in [`AddressMode::Published`].
    pub published_host: String,
    /// Database port inside the container.
    pub internal_port: u16,
}

impl Default for TenantEndpoint {
    fn default() -> Self {
        Self {
            mode: AddressMode::Network,
            published_host: "127.0.0.1".to_string(),
            internal_port: 5432,
        }
    }
}

impl TenantEndpoint {
    /// Builds a libpq key/value connection string for the tenant database.
    #[must_use]
    pub fn connection_string(&self, record: &TenantRecord) -> String {
        let (host, port) = self.host_port(record);
        format!(
            "host={} port={port} user={} password={} dbname={}",
            quote_conninfo(&host),
            quote_conninfo(record.username.as_str()),
            quote_conninfo(&record.password),
            quote_conninfo(record.username.as_str()),
        )
    }

    /// Resolves host and port for the configured mode.
    fn host_port(&self, record: &TenantRecord) -> (String, u16) {
        match self.mode {
            AddressMode::Network => (record.container_hostname.clone(), self.internal_port),
            AddressMode::Published => (self.published_host.clone(), record.container_port),
        }
    }
}

/// Quotes a libpq key/value connection string value, escaping backslashes
/// and single quotes.
#[must_use]
pub fn quote_conninfo(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use time::macros::datetime;

    use super::AddressMode;
    use super::TenantEndpoint;
    use super::TenantRecord;
    use super::quote_conninfo;
    use crate::core::identifiers::Username;

    fn record() -> TenantRecord {
        TenantRecord {
            username: Username::parse("alice").unwrap(),
            password: "p'ss\\word".to_string(),
            container_id: "abc123".to_string(),
            container_hostname: "postgres_alice".to_string(),
            container_port: 50_123,
            registered_at: datetime!(2026-03-01 12:30:45 UTC),
        }
    }

    #[test]
    fn network_mode_targets_container_hostname() {
        let endpoint = TenantEndpoint::default();
        let conn = endpoint.connection_string(&record());
        assert_eq!(
            conn,
            "host='postgres_alice' port=5432 user='alice' password='p\\'ss\\\\word' \
             dbname='alice'"
        );
    }

    #[test]
    fn published_mode_targets_host_port() {
        let endpoint = TenantEndpoint {
            mode: AddressMode::Published,
            published_host: "10.0.0.5".to_string(),
            internal_port: 5432,
        };
        let conn = endpoint.connection_string(&record());
        assert!(conn.starts_with("host='10.0.0.5' port=50123 user='alice' "), "{conn}");
    }

    #[test]
    fn conninfo_values_escape_quotes_and_backslashes() {
        assert_eq!(quote_conninfo("plain"), "'plain'");
        assert_eq!(quote_conninfo("it's"), "'it\\'s'");
        assert_eq!(quote_conninfo("a\\b"), "'a\\\\b'");
        assert_eq!(quote_conninfo("two words"), "'two words'");
    }

    #[test]
    fn registration_time_roundtrips_at_second_precision() {
        let record = record();
        let text = record.registration_time();
        assert_eq!(text, "2026-03-01 12:30:45");
        let parsed = TenantRecord::parse_registration_time(&text).unwrap();
        assert_eq!(parsed, record.registered_at);
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", record());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("word"));
    }
}
