// crates/tenantdb-core/src/core/mod.rs
// ============================================================================
// Module: Tenant DB Core Types
// Description: Identifiers, records, schema values, and the error taxonomy.
// Purpose: Group the data model shared by every Tenant DB crate.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types are plain data: they carry no I/O and are safe to share across
//! threads. Validation happens at construction so downstream code can rely on
//! well-formed usernames and column types.

pub mod error;
pub mod identifiers;
pub mod record;
pub mod schema;

pub use error::TenantError;
pub use identifiers::ContainerName;
pub use identifiers::Username;
pub use record::AddressMode;
pub use record::TenantEndpoint;
pub use record::TenantRecord;
pub use record::quote_conninfo;
pub use schema::ColumnType;
pub use schema::IdentifierPolicy;
pub use schema::Row;
pub use schema::RowValue;
