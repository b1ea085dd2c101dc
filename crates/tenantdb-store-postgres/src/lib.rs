// crates/tenantdb-store-postgres/src/lib.rs
// ============================================================================
// Module: Tenant DB Postgres Store
// Description: PostgreSQL registry store and tenant connection pools.
// Purpose: Provide the durable backends behind the Tenant DB interfaces.
// Dependencies: tenantdb-core, postgres, r2d2, r2d2_postgres
// ============================================================================

//! ## Overview
//! [`PostgresRegistryStore`] persists tenant records in the central registry
//! database. [`PostgresPoolFactory`] builds one [`PostgresTenantPool`] per
//! tenant for the pool registry. Both use blocking r2d2 pools.

pub mod registry;
pub mod tenant_pool;
pub mod values;

pub use registry::PostgresRegistryConfig;
pub use registry::PostgresRegistryStore;
pub use registry::PostgresStoreError;
pub use registry::shared_postgres_registry;
pub use tenant_pool::PostgresPoolFactory;
pub use tenant_pool::PostgresTenantPool;
pub use tenant_pool::TenantPoolSettings;
pub use values::SqlValue;
pub use values::decode_row;
