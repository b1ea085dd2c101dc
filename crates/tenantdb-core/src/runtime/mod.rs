// crates/tenantdb-core/src/runtime/mod.rs
// ============================================================================
// Module: Tenant DB Runtime
// Description: Port allocation, pool registry, gateway, and tenant service.
// Purpose: Implement per-tenant resource lifecycle on top of the interfaces.
// Dependencies: crate::{core, interfaces}, rand
// ============================================================================

//! ## Overview
//! Runtime modules hold the only cross-request mutable state in the core: the
//! pool registry map and the port allocator's in-use set. Both synchronize
//! internally and are owned by [`TenantService`], which transports share.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod gateway;
pub mod listing;
pub mod pool;
pub mod ports;
pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use gateway::Statement;
pub use gateway::StatementBuilder;
pub use gateway::TenantGateway;
pub use listing::LIST_TABLES_SQL;
pub use listing::parse_table_listing;
pub use pool::DEFAULT_MAX_POOLS;
pub use pool::PoolRegistry;
pub use ports::DEFAULT_MAX_ATTEMPTS;
pub use ports::PortAllocator;
pub use ports::PortCheck;
pub use ports::PortRange;
pub use service::MAX_PASSWORD_LENGTH;
pub use service::TenantService;
pub use service::TenantServiceConfig;
pub use store::InMemoryRegistryStore;
pub use store::SharedRegistryStore;
