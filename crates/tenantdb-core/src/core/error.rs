// crates/tenantdb-core/src/core/error.rs
// ============================================================================
// Module: Tenant DB Errors
// Description: Error taxonomy shared by provisioning, pooling, and queries.
// Purpose: Give every failure a distinguishable kind and readable detail.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every operation in the core returns [`TenantError`]. Kinds are stable so
//! transports can map them onto status codes and audit labels. The core never
//! retries on its own; retries belong to callers.

use thiserror::Error;

/// Tenant DB error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantError {
    /// Missing or malformed input.
    #[error("validation error: {0}")]
    Validation(String),
    /// Container or username is absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// Registry unique constraint violated.
    #[error("username already registered: {0}")]
    DuplicateUsername(String),
    /// Container, network, port, or pool creation failed.
    #[error("creation failed: {0}")]
    CreationFailed(String),
    /// Pool at capacity and the bounded wait elapsed.
    #[error("pool exhausted: {0}")]
    PoolExhausted(String),
    /// SQL error from the engine or nonzero exit from the database client.
    #[error("query failed: {0}")]
    QueryFailed(String),
    /// Unknown column type name.
    #[error("unsupported column type: {0}")]
    UnsupportedType(String),
}

impl TenantError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::DuplicateUsername(_) => "duplicate_username",
            Self::CreationFailed(_) => "creation_failed",
            Self::PoolExhausted(_) => "pool_exhausted",
            Self::QueryFailed(_) => "query_failed",
            Self::UnsupportedType(_) => "unsupported_type",
        }
    }

    /// Returns the human-readable detail without the kind prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(detail)
            | Self::NotFound(detail)
            | Self::DuplicateUsername(detail)
            | Self::CreationFailed(detail)
            | Self::PoolExhausted(detail)
            | Self::QueryFailed(detail)
            | Self::UnsupportedType(detail) => detail,
        }
    }
}
