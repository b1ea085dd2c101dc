// crates/tenantdb-server/src/error.rs
// ============================================================================
// Module: HTTP Errors
// Description: Error envelope and status mapping for HTTP responses.
// Purpose: Give every failure a stable kind label and status code.
// Dependencies: tenantdb-core, axum, serde
// ============================================================================

//! ## Overview
//! Failures render as `{"error": {"kind": "...", "message": "..."}}`. The
//! kind is the [`TenantError::kind`] label, plus `internal` for failures of
//! the server itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use tenantdb_core::TenantError;
use thiserror::Error;

// ============================================================================
// SECTION: API Error
// ============================================================================

/// Failure returned by an HTTP handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Domain failure from the tenant service.
    Tenant(TenantError),
    /// Server-side failure (worker panic, serialization).
    Internal(String),
}

impl ApiError {
    /// Stable kind label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Tenant(err) => err.kind(),
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Tenant(err) => status_for(err),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Tenant(err) => err.detail(),
            Self::Internal(message) => message,
        }
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        Self::Tenant(err)
    }
}

/// Maps a tenant error to its HTTP status.
#[must_use]
pub const fn status_for(err: &TenantError) -> StatusCode {
    match err {
        TenantError::Validation(_)
        | TenantError::UnsupportedType(_)
        | TenantError::QueryFailed(_) => StatusCode::BAD_REQUEST,
        TenantError::NotFound(_) => StatusCode::NOT_FOUND,
        TenantError::DuplicateUsername(_) => StatusCode::CONFLICT,
        TenantError::PoolExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
        TenantError::CreationFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Error envelope body.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    /// Error payload.
    error: ErrorBody<'a>,
}

/// Error payload.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    /// Stable kind label.
    kind: &'static str,
    /// Human-readable message.
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                kind: self.kind(),
                message: self.message(),
            },
        };
        (self.status(), Json(envelope)).into_response()
    }
}

// ============================================================================
// SECTION: Server Error
// ============================================================================

/// Server startup and transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tenantdb_core::TenantError;

    use super::ApiError;
    use super::status_for;

    #[test]
    fn statuses_follow_error_kinds() {
        let cases = [
            (TenantError::Validation(String::new()), StatusCode::BAD_REQUEST),
            (TenantError::UnsupportedType(String::new()), StatusCode::BAD_REQUEST),
            (TenantError::QueryFailed(String::new()), StatusCode::BAD_REQUEST),
            (TenantError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (TenantError::DuplicateUsername(String::new()), StatusCode::CONFLICT),
            (TenantError::PoolExhausted(String::new()), StatusCode::SERVICE_UNAVAILABLE),
            (TenantError::CreationFailed(String::new()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{}", err.kind());
        }
        assert_eq!(ApiError::Internal("x".to_string()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
