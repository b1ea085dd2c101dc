// crates/tenantdb-config/src/lib.rs
// ============================================================================
// Module: Tenant DB Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for tenantdb.toml semantics.
// Dependencies: tenantdb-core, serde, toml
// ============================================================================

//! ## Overview
//! `tenantdb-config` defines the configuration model for the Tenant DB
//! service. Validation is fail-closed: a config that loads is safe to wire
//! into the runtime without further checks.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
