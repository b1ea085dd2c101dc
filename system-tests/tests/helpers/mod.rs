// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Tenant DB system-tests.
// Purpose: Provide the PostgreSQL fixture and unique test names.
// Dependencies: system-tests, testcontainers, postgres
// ============================================================================

//! ## Overview
//! Shared helpers for Tenant DB system-tests.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod infra;

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Returns a name that is unique within the test run (valid as a username).
pub fn unique_name(prefix: &str) -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.subsec_nanos());
    format!("{prefix}_{nanos}_{}", COUNTER.fetch_add(1, Ordering::SeqCst))
}
