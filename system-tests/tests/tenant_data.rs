// system-tests/tests/tenant_data.rs
// ============================================================================
// Module: Tenant Data Suite
// Description: Tenant pool and gateway checks against a live PostgreSQL.
// Purpose: Exercise CRUD statements and pool lifecycle end-to-end.
// Dependencies: suites/tenant_gateway.rs, suites/pool_lifecycle.rs, helpers
// ============================================================================

//! Tenant data suite entry point for system-tests.

mod helpers;

#[path = "suites/pool_lifecycle.rs"]
mod pool_lifecycle;
#[path = "suites/tenant_gateway.rs"]
mod tenant_gateway;
