// crates/tenantdb-server/src/lib.rs
// ============================================================================
// Module: Tenant DB Server Library
// Description: HTTP routes, error envelopes, and audit sinks for Tenant DB.
// Purpose: Expose the tenant service over axum.
// Dependencies: crate::{audit, error, routes, server}
// ============================================================================

//! ## Overview
//! The server is a thin adapter: handlers parse input, call
//! [`tenantdb_core::TenantService`], and render results or the JSON error
//! envelope. Each request emits one audit event.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod error;
pub mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditObserver;
pub use audit::AuditOutcome;
pub use audit::FileAuditSink;
pub use audit::LifecycleAuditEvent;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::TenantAuditEvent;
pub use audit::TenantAuditEventParams;
pub use audit::TenantAuditSink;
pub use error::ApiError;
pub use error::ServerError;
pub use error::status_for;
pub use routes::AppState;
pub use routes::router;
pub use server::PostgresTenantService;
pub use server::TenantDbServer;
