// crates/tenantdb-core/src/runtime/pool.rs
// ============================================================================
// Module: Connection Pool Registry
// Description: Process-scoped, bounded cache of per-tenant connection pools.
// Purpose: Create each tenant pool once, reuse it, and cap how many are held.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`PoolRegistry`] maps usernames to live pools built by a [`PoolFactory`].
//!
//! Locking is two-level:
//! - the registry lock guards the map and LRU ticks and is never held while
//!   a pool is built;
//! - each entry owns a slot lock that is held while its pool is built, so
//!   concurrent first accesses for one username wait on a single creation
//!   while other usernames proceed independently.
//!
//! Lock order is slot, then registry. Each entry carries a `built` flag
//! that is set under the registry lock once its pool exists; eviction only
//! considers built entries and never touches slot locks.
//!
//! A caller whose slot is replaced by a newer connection string while it is
//! waiting or building discards its work and follows the current entry.
//!
//! Evicted pools are dropped once the last borrowed handle is released.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::core::TenantError;
use crate::core::Username;
use crate::interfaces::LifecycleEvent;
use crate::interfaces::LifecycleObserver;
use crate::interfaces::NoopObserver;
use crate::interfaces::PoolFactory;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default maximum number of pools held at once.
pub const DEFAULT_MAX_POOLS: usize = 64;

// ============================================================================
// SECTION: Registry State
// ============================================================================

/// Per-username creation slot.
struct PoolSlot<P> {
    /// Built pool, `None` until creation succeeds.
    pool: Mutex<Option<Arc<P>>>,
}

impl<P> PoolSlot<P> {
    /// Creates an empty slot.
    const fn empty() -> Self {
        Self {
            pool: Mutex::new(None),
        }
    }
}

/// Map entry for one username.
struct RegistryEntry<P> {
    /// Creation slot.
    slot: Arc<PoolSlot<P>>,
    /// Connection string the slot was created for.
    connection: String,
    /// LRU tick of the last access.
    last_used: u64,
    /// Set once the slot holds a pool.
    built: bool,
}

/// Map plus LRU clock.
struct RegistryState<P> {
    /// Entries by username.
    entries: HashMap<Username, RegistryEntry<P>>,
    /// Monotonic access counter.
    tick: u64,
}

// ============================================================================
// SECTION: Pool Registry
// ============================================================================

/// Bounded, per-username-serialized cache of tenant pools.
pub struct PoolRegistry<F: PoolFactory> {
    /// Pool factory.
    factory: F,
    /// Maximum pools held before LRU eviction.
    max_entries: usize,
    /// Map and LRU state.
    state: Mutex<RegistryState<F::Pool>>,
    /// Number of successful factory constructions.
    created: AtomicU64,
    /// Lifecycle observer.
    observer: Arc<dyn LifecycleObserver>,
}

impl<F: PoolFactory> PoolRegistry<F> {
    /// Creates a registry holding at most `max_entries` pools.
    #[must_use]
    pub fn new(factory: F, max_entries: usize) -> Self {
        Self {
            factory,
            max_entries: max_entries.max(1),
            state: Mutex::new(RegistryState {
                entries: HashMap::new(),
                tick: 0,
            }),
            created: AtomicU64::new(0),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Replaces the lifecycle observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the pool for `username`, building it on first access.
    ///
    /// A changed connection string replaces the cached entry.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::CreationFailed`] when the factory fails. A
    /// failed creation leaves no entry behind.
    pub fn get_or_create_pool(
        &self,
        username: &Username,
        connection: &str,
    ) -> Result<Arc<F::Pool>, TenantError> {
        let mut connection = connection.to_string();
        loop {
            let slot = self.slot_for(username, &connection)?;
            let mut guard = lock_slot(&slot)?;
            if let Some(pool) = guard.as_ref() {
                return Ok(Arc::clone(pool));
            }
            // A failed creator removed this slot, or a newer connection
            // string replaced it, while we waited on it.
            if !self.is_current(username, &slot)? {
                drop(guard);
                self.follow_current(username, &mut connection)?;
                continue;
            }
            return match self.factory.create(username, &connection) {
                Ok(pool) => {
                    if !self.mark_built(username, &slot)? {
                        drop(guard);
                        drop(pool);
                        self.follow_current(username, &mut connection)?;
                        continue;
                    }
                    let pool = Arc::new(pool);
                    *guard = Some(Arc::clone(&pool));
                    drop(guard);
                    self.created.fetch_add(1, Ordering::SeqCst);
                    self.observer.on_event(&LifecycleEvent::PoolCreated {
                        username: username.clone(),
                    });
                    self.enforce_capacity(username)?;
                    Ok(pool)
                }
                Err(err) => {
                    self.remove_slot(username, &slot)?;
                    drop(guard);
                    self.observer.on_event(&LifecycleEvent::PoolCreationFailed {
                        username: username.clone(),
                        error: err.clone(),
                    });
                    Err(err)
                }
            };
        }
    }

    /// Eagerly builds the pool for a newly registered tenant.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::CreationFailed`] when the factory fails.
    pub fn register(&self, username: &Username, connection: &str) -> Result<(), TenantError> {
        self.get_or_create_pool(username, connection).map(|_| ())
    }

    /// Drops the entry for `username`. Entries still being built are kept.
    ///
    /// Returns true when an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::CreationFailed`] when registry state is poisoned.
    pub fn evict(&self, username: &Username) -> Result<bool, TenantError> {
        let removed = {
            let mut state = self.lock_state()?;
            let built = state.entries.get(username).is_some_and(|entry| entry.built);
            built && state.entries.remove(username).is_some()
        };
        if removed {
            self.observer.on_event(&LifecycleEvent::PoolEvicted {
                username: username.clone(),
            });
        }
        Ok(removed)
    }

    /// Number of entries, including ones still being created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.entries.len()).unwrap_or_default()
    }

    /// Returns true when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true when an entry exists for `username`.
    #[must_use]
    pub fn contains(&self, username: &Username) -> bool {
        self.state.lock().is_ok_and(|state| state.entries.contains_key(username))
    }

    /// Number of pools the factory has built since startup.
    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    /// Returns the slot for `username`, inserting or replacing as needed.
    fn slot_for(
        &self,
        username: &Username,
        connection: &str,
    ) -> Result<Arc<PoolSlot<F::Pool>>, TenantError> {
        let mut state = self.lock_state()?;
        state.tick += 1;
        let tick = state.tick;
        if let Some(entry) = state.entries.get_mut(username)
            && entry.connection == connection
        {
            entry.last_used = tick;
            return Ok(Arc::clone(&entry.slot));
        }
        let slot = Arc::new(PoolSlot::empty());
        state.entries.insert(
            username.clone(),
            RegistryEntry {
                slot: Arc::clone(&slot),
                connection: connection.to_string(),
                last_used: tick,
                built: false,
            },
        );
        drop(state);
        Ok(slot)
    }

    /// Returns true when `slot` is still the mapped slot for `username`.
    fn is_current(
        &self,
        username: &Username,
        slot: &Arc<PoolSlot<F::Pool>>,
    ) -> Result<bool, TenantError> {
        let state = self.lock_state()?;
        Ok(state.entries.get(username).is_some_and(|entry| Arc::ptr_eq(&entry.slot, slot)))
    }

    /// Flags the entry built when it still maps to `slot`.
    ///
    /// Returns false when `slot` was replaced or removed meanwhile.
    fn mark_built(
        &self,
        username: &Username,
        slot: &Arc<PoolSlot<F::Pool>>,
    ) -> Result<bool, TenantError> {
        let mut state = self.lock_state()?;
        match state.entries.get_mut(username) {
            Some(entry) if Arc::ptr_eq(&entry.slot, slot) => {
                entry.built = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Adopts the connection string of the current entry, if any.
    fn follow_current(
        &self,
        username: &Username,
        connection: &mut String,
    ) -> Result<(), TenantError> {
        let state = self.lock_state()?;
        if let Some(entry) = state.entries.get(username) {
            connection.clone_from(&entry.connection);
        }
        drop(state);
        Ok(())
    }

    /// Removes the entry for `username` when it still maps to `slot`.
    fn remove_slot(
        &self,
        username: &Username,
        slot: &Arc<PoolSlot<F::Pool>>,
    ) -> Result<(), TenantError> {
        let mut state = self.lock_state()?;
        if state.entries.get(username).is_some_and(|entry| Arc::ptr_eq(&entry.slot, slot)) {
            state.entries.remove(username);
        }
        drop(state);
        Ok(())
    }

    /// Evicts least recently used pools until the cap holds.
    fn enforce_capacity(&self, keep: &Username) -> Result<(), TenantError> {
        let mut evicted = Vec::new();
        {
            let mut state = self.lock_state()?;
            while state.entries.len() > self.max_entries {
                let victim = state
                    .entries
                    .iter()
                    .filter(|(name, entry)| *name != keep && entry.built)
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(name, _)| name.clone());
                let Some(victim) = victim else {
                    break;
                };
                state.entries.remove(&victim);
                evicted.push(victim);
            }
        }
        for username in evicted {
            self.observer.on_event(&LifecycleEvent::PoolEvicted {
                username,
            });
        }
        Ok(())
    }

    /// Locks registry state.
    fn lock_state(&self) -> Result<MutexGuard<'_, RegistryState<F::Pool>>, TenantError> {
        self.state
            .lock()
            .map_err(|_| TenantError::CreationFailed("pool registry mutex poisoned".to_string()))
    }
}

/// Locks a creation slot.
fn lock_slot<P>(slot: &PoolSlot<P>) -> Result<MutexGuard<'_, Option<Arc<P>>>, TenantError> {
    slot.pool
        .lock()
        .map_err(|_| TenantError::CreationFailed("pool slot mutex poisoned".to_string()))
}
