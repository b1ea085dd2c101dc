// crates/tenantdb-core/src/core/identifiers.rs
// ============================================================================
// Module: Tenant DB Identifiers
// Description: Validated tenant usernames and deterministic container names.
// Purpose: Keep names safe to reuse as role, database, and container names.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Username`] is used verbatim as the `PostgreSQL` role, the tenant
//! database name, and the container name suffix, so it is validated once at
//! the boundary. [`ContainerName`] derives the container name from it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::TenantError;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum username length (`PostgreSQL` identifier limit).
pub const MAX_USERNAME_LENGTH: usize = 63;

// ============================================================================
// SECTION: Username
// ============================================================================

/// Registered tenant username.
///
/// # Invariants
/// - 1 to [`MAX_USERNAME_LENGTH`] characters.
/// - ASCII letters, digits, and underscore; the first character is not a digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Parses and validates a username.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] when the name is empty, too long,
    /// or contains characters outside the allowed set.
    pub fn parse(raw: &str) -> Result<Self, TenantError> {
        if raw.is_empty() {
            return Err(TenantError::Validation("username must be non-empty".to_string()));
        }
        if raw.len() > MAX_USERNAME_LENGTH {
            return Err(TenantError::Validation(format!(
                "username exceeds {MAX_USERNAME_LENGTH} characters"
            )));
        }
        let mut chars = raw.chars();
        if chars.next().is_some_and(|first| first.is_ascii_digit()) {
            return Err(TenantError::Validation("username must not start with a digit".to_string()));
        }
        if !raw.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(TenantError::Validation(
                "username may only contain ASCII letters, digits, and underscore".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for Username {
    type Error = TenantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Container Name
// ============================================================================

/// Deterministic container name for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    /// Derives the container name from a prefix and username.
    #[must_use]
    pub fn for_tenant(prefix: &str, username: &Username) -> Self {
        Self(format!("{prefix}{}", username.as_str()))
    }

    /// Returns the container name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
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
    use super::ContainerName;
    use super::MAX_USERNAME_LENGTH;
    use super::Username;
    use crate::core::error::TenantError;

    #[test]
    fn username_accepts_identifier_shapes() {
        for raw in ["alice", "_svc", "Team_42", "a"] {
            assert!(Username::parse(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn username_rejects_unsafe_shapes() {
        let too_long = "a".repeat(MAX_USERNAME_LENGTH + 1);
        for raw in ["", "1abc", "bob-smith", "x y", "drop;table", "é", too_long.as_str()] {
            assert!(
                matches!(Username::parse(raw), Err(TenantError::Validation(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn container_name_uses_prefix() {
        let username = Username::parse("alice").unwrap();
        assert_eq!(ContainerName::for_tenant("postgres_", &username).as_str(), "postgres_alice");
    }

    #[test]
    fn username_deserialize_validates() {
        let parsed: Result<Username, _> = serde_json::from_str("\"ok_name\"");
        assert!(parsed.is_ok());
        let rejected: Result<Username, _> = serde_json::from_str("\"bad name\"");
        assert!(rejected.is_err());
    }
}
