// crates/tenantdb-core/src/lib.rs
// ============================================================================
// Module: Tenant DB Core Library
// Description: Public API surface for the Tenant DB core.
// Purpose: Expose tenant types, backend interfaces, and runtime services.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Tenant DB core provisions one isolated database per registered user and
//! manages the per-tenant resources that come with it: host ports, container
//! handles, registry records, and connection pools. It is backend-agnostic and
//! integrates with Docker and PostgreSQL through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ContainerHandle;
pub use interfaces::ContainerRuntime;
pub use interfaces::ContainerSpec;
pub use interfaces::LifecycleEvent;
pub use interfaces::LifecycleObserver;
pub use interfaces::NetworkHandle;
pub use interfaces::NoopObserver;
pub use interfaces::PoolFactory;
pub use interfaces::ProvisionedContainer;
pub use interfaces::RegistryStore;
pub use interfaces::SqlShell;
pub use interfaces::TenantDatabase;
pub use runtime::DEFAULT_MAX_ATTEMPTS;
pub use runtime::DEFAULT_MAX_POOLS;
pub use runtime::InMemoryRegistryStore;
pub use runtime::LIST_TABLES_SQL;
pub use runtime::MAX_PASSWORD_LENGTH;
pub use runtime::PoolRegistry;
pub use runtime::PortAllocator;
pub use runtime::PortCheck;
pub use runtime::PortRange;
pub use runtime::SharedRegistryStore;
pub use runtime::Statement;
pub use runtime::StatementBuilder;
pub use runtime::TenantGateway;
pub use runtime::TenantService;
pub use runtime::TenantServiceConfig;
pub use runtime::parse_table_listing;
