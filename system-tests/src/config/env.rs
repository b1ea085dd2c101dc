// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed. Parsing goes through a lookup
//! function so tests can supply values without mutating the process
//! environment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Image used when no external database is configured.
pub const DEFAULT_POSTGRES_IMAGE: &str = "postgres:16-alpine";

/// Default wait for a started database to accept connections.
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Connection string of an existing `PostgreSQL` (skips testcontainers).
    PostgresUrl,
    /// Image override as `name:tag`.
    PostgresImage,
    /// Readiness timeout override in seconds (positive integer).
    TimeoutSeconds,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PostgresUrl => "TENANTDB_SYSTEM_PG_URL",
            Self::PostgresImage => "TENANTDB_SYSTEM_PG_IMAGE",
            Self::TimeoutSeconds => "TENANTDB_SYSTEM_TEST_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTestConfig {
    /// Existing database to use instead of a container.
    pub postgres_url: Option<String>,
    /// Image name.
    pub image_name: String,
    /// Image tag.
    pub image_tag: String,
    /// Wait for the database to accept connections.
    pub ready_timeout: Duration,
}

impl Default for SystemTestConfig {
    fn default() -> Self {
        let (name, tag) = split_image(DEFAULT_POSTGRES_IMAGE);
        Self {
            postgres_url: None,
            image_name: name,
            image_tag: tag,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation.
    pub fn load() -> Result<Self, String> {
        Self::from_lookup(read_env_strict)
    }

    /// Loads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is empty or fails validation.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Result<Option<String>, String>,
    ) -> Result<Self, String> {
        let read = |key: SystemTestEnv| -> Result<Option<String>, String> {
            let name = key.as_str();
            match lookup(name)? {
                Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
                other => Ok(other),
            }
        };
        let mut config = Self {
            postgres_url: read(SystemTestEnv::PostgresUrl)?,
            ..Self::default()
        };
        if let Some(image) = read(SystemTestEnv::PostgresImage)? {
            let (name, tag) = split_image(image.trim());
            config.image_name = name;
            config.image_tag = tag;
        }
        if let Some(raw) = read(SystemTestEnv::TimeoutSeconds)? {
            config.ready_timeout =
                parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &raw)?;
        }
        Ok(config)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Splits `name:tag`, defaulting the tag to `latest`.
fn split_image(image: &str) -> (String, String) {
    image.rsplit_once(':').filter(|(_, tag)| !tag.contains('/')).map_or_else(
        || (image.to_string(), "latest".to_string()),
        |(name, tag)| (name.to_string(), tag.to_string()),
    )
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
