// system-tests/src/lib.rs
// ============================================================================
// Module: Tenant DB System Tests Library
// Description: Shared configuration for system test binaries.
// Purpose: Provide environment-driven settings for PostgreSQL fixtures.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts configuration used by the Tenant DB system-test binaries
//! in `system-tests/tests`. The binaries only build with
//! `--features system-tests`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
