// crates/tenantdb-core/src/runtime/store.rs
// ============================================================================
// Module: Tenant DB In-Memory Registry
// Description: In-memory registry store and a shared trait-object wrapper.
// Purpose: Provide a registry without external deps for tests and local runs.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryRegistryStore`] implements [`RegistryStore`] over a mutex-guarded
//! map. It is not durable and is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::TenantError;
use crate::core::TenantRecord;
use crate::core::Username;
use crate::interfaces::RegistryStore;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory registry store for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegistryStore {
    /// Records keyed by username.
    records: Arc<Mutex<BTreeMap<Username, TenantRecord>>>,
}

impl InMemoryRegistryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStore for InMemoryRegistryStore {
    fn init_schema(&self) -> Result<(), TenantError> {
        Ok(())
    }

    fn save(&self, record: &TenantRecord) -> Result<(), TenantError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| TenantError::QueryFailed("registry store mutex poisoned".to_string()))?;
        if guard.contains_key(&record.username) {
            return Err(TenantError::DuplicateUsername(record.username.to_string()));
        }
        guard.insert(record.username.clone(), record.clone());
        drop(guard);
        Ok(())
    }

    fn get(&self, username: &Username) -> Result<Option<TenantRecord>, TenantError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| TenantError::QueryFailed("registry store mutex poisoned".to_string()))?;
        Ok(guard.get(username).cloned())
    }

    fn list(&self) -> Result<Vec<TenantRecord>, TenantError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| TenantError::QueryFailed("registry store mutex poisoned".to_string()))?;
        Ok(guard.values().cloned().collect())
    }
}

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Shared registry store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedRegistryStore {
    /// Inner store implementation.
    inner: Arc<dyn RegistryStore + Send + Sync>,
}

impl SharedRegistryStore {
    /// Wraps a registry store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl RegistryStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn RegistryStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl RegistryStore for SharedRegistryStore {
    fn init_schema(&self) -> Result<(), TenantError> {
        self.inner.init_schema()
    }

    fn save(&self, record: &TenantRecord) -> Result<(), TenantError> {
        self.inner.save(record)
    }

    fn get(&self, username: &Username) -> Result<Option<TenantRecord>, TenantError> {
        self.inner.get(username)
    }

    fn list(&self) -> Result<Vec<TenantRecord>, TenantError> {
        self.inner.list()
    }
}
