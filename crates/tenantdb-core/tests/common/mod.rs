// crates/tenantdb-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Fake container runtime, pools, and observers for core tests.
// Purpose: Exercise the runtime without Docker or PostgreSQL.
// Dependencies: tenantdb-core
// ============================================================================

//! ## Overview
//! Fakes record every call so tests can assert on side effects such as how
//! many containers were launched or pools were built.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures use unwrap on deterministic state."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use tenantdb_core::ContainerHandle;
use tenantdb_core::ContainerName;
use tenantdb_core::ContainerRuntime;
use tenantdb_core::ContainerSpec;
use tenantdb_core::InMemoryRegistryStore;
use tenantdb_core::LifecycleEvent;
use tenantdb_core::LifecycleObserver;
use tenantdb_core::NetworkHandle;
use tenantdb_core::PoolFactory;
use tenantdb_core::PoolRegistry;
use tenantdb_core::PortAllocator;
use tenantdb_core::PortCheck;
use tenantdb_core::PortRange;
use tenantdb_core::ProvisionedContainer;
use tenantdb_core::RegistryStore;
use tenantdb_core::Row;
use tenantdb_core::RowValue;
use tenantdb_core::SharedRegistryStore;
use tenantdb_core::SqlShell;
use tenantdb_core::TenantDatabase;
use tenantdb_core::TenantError;
use tenantdb_core::TenantRecord;
use tenantdb_core::TenantService;
use tenantdb_core::TenantServiceConfig;
use tenantdb_core::Username;

// ============================================================================
// SECTION: Latch
// ============================================================================

/// One-shot gate that blocks waiters until opened.
#[derive(Default)]
pub struct Latch {
    open: Mutex<bool>,
    cond: Condvar,
}

impl Latch {
    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cond.notify_all();
    }

    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cond.wait(open).unwrap();
        }
    }
}

// ============================================================================
// SECTION: Fake Tenant Database
// ============================================================================

/// Tenant database that records statements and replays canned results.
#[derive(Debug, Default)]
pub struct FakeDatabase {
    pub connection: String,
    pub statements: Mutex<Vec<(String, Vec<RowValue>)>>,
    pub rows: Mutex<Vec<Row>>,
    pub affected: AtomicU64,
}

impl FakeDatabase {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn last_sql(&self) -> String {
        self.statements.lock().unwrap().last().map(|(sql, _)| sql.clone()).unwrap_or_default()
    }
}

impl TenantDatabase for FakeDatabase {
    fn ping(&self) -> Result<(), TenantError> {
        self.statements.lock().unwrap().push(("SELECT 1".to_string(), Vec::new()));
        Ok(())
    }

    fn execute(&self, sql: &str, params: &[RowValue]) -> Result<u64, TenantError> {
        self.statements.lock().unwrap().push((sql.to_string(), params.to_vec()));
        Ok(self.affected.load(Ordering::SeqCst))
    }

    fn query(&self, sql: &str, params: &[RowValue]) -> Result<Vec<Row>, TenantError> {
        self.statements.lock().unwrap().push((sql.to_string(), params.to_vec()));
        Ok(self.rows.lock().unwrap().clone())
    }
}

/// Single-row result holding an `id`.
pub fn id_row(id: i64) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), RowValue::Integer(id));
    row
}

// ============================================================================
// SECTION: Fake Pool Factory
// ============================================================================

/// Pool factory with a creation counter, failures, delays, and a blocker.
///
/// The blocker matches either a username or a connection string.
#[derive(Default)]
pub struct FakeFactory {
    pub attempts: AtomicUsize,
    pub delay: Duration,
    pub failing: BTreeSet<String>,
    pub blocked: Option<(String, Arc<Latch>)>,
    pub rows: Vec<Row>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing(usernames: &[&str]) -> Self {
        Self {
            failing: usernames.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn blocking(username: &str, latch: Arc<Latch>) -> Self {
        Self {
            blocked: Some((username.to_string(), latch)),
            ..Self::default()
        }
    }
}

impl PoolFactory for FakeFactory {
    type Pool = FakeDatabase;

    fn create(&self, username: &Username, connection: &str) -> Result<FakeDatabase, TenantError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some((blocked, latch)) = &self.blocked
            && (blocked == username.as_str() || blocked == connection)
        {
            latch.wait();
        }
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if self.failing.contains(username.as_str()) {
            return Err(TenantError::CreationFailed(format!("unreachable: {username}")));
        }
        Ok(FakeDatabase {
            connection: connection.to_string(),
            rows: Mutex::new(self.rows.clone()),
            ..FakeDatabase::default()
        })
    }
}

pub fn user(name: &str) -> Username {
    Username::parse(name).unwrap()
}

// ============================================================================
// SECTION: Fake Container Runtime
// ============================================================================

/// Container runtime and SQL shell that track launches in memory.
#[derive(Default)]
pub struct FakeRuntime {
    pub networks: Mutex<BTreeSet<String>>,
    pub containers: Mutex<Vec<ContainerSpec>>,
    pub fail_create: bool,
    pub fail_network: bool,
    pub network_calls: AtomicUsize,
    pub network_gate: Option<Arc<Latch>>,
    pub shell_calls: Mutex<Vec<(String, String)>>,
    pub shell_output: Mutex<BTreeMap<String, String>>,
}

impl FakeRuntime {
    pub fn container_count(&self) -> usize {
        self.containers.lock().unwrap().len()
    }

    pub fn respond(&self, sql: &str, output: &str) {
        self.shell_output.lock().unwrap().insert(sql.to_string(), output.to_string());
    }
}

impl ContainerRuntime for FakeRuntime {
    fn ensure_network(&self, name: &str) -> Result<NetworkHandle, TenantError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.network_gate {
            gate.wait();
        }
        if self.fail_network {
            return Err(TenantError::CreationFailed("network unavailable".to_string()));
        }
        let created = self.networks.lock().unwrap().insert(name.to_string());
        Ok(NetworkHandle {
            id: format!("net-{name}"),
            name: name.to_string(),
            created,
        })
    }

    fn create_database_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ProvisionedContainer, TenantError> {
        if self.fail_create {
            return Err(TenantError::CreationFailed("image missing".to_string()));
        }
        let mut containers = self.containers.lock().unwrap();
        if containers.iter().any(|existing| existing.name == spec.name) {
            return Err(TenantError::CreationFailed(format!("name in use: {}", spec.name)));
        }
        containers.push(spec.clone());
        Ok(ProvisionedContainer {
            handle: ContainerHandle {
                id: format!("cid-{}", containers.len()),
                name: spec.name.clone(),
            },
            hostname: spec.name.to_string(),
            host_port: spec.host_port,
        })
    }

    fn locate_container(&self, name: &ContainerName) -> Result<ContainerHandle, TenantError> {
        let containers = self.containers.lock().unwrap();
        containers
            .iter()
            .position(|spec| spec.name == *name)
            .map(|index| ContainerHandle {
                id: format!("cid-{}", index + 1),
                name: name.clone(),
            })
            .ok_or_else(|| TenantError::NotFound(format!("container {name} not found")))
    }
}

impl SqlShell for FakeRuntime {
    fn run(
        &self,
        container: &ContainerHandle,
        sql: &str,
        _db_user: &str,
        _db_name: &str,
    ) -> Result<String, TenantError> {
        self.shell_calls.lock().unwrap().push((container.name.to_string(), sql.to_string()));
        Ok(self.shell_output.lock().unwrap().get(sql).cloned().unwrap_or_default())
    }
}

// ============================================================================
// SECTION: Registry Stores
// ============================================================================

/// Registry whose saves always fail with a transport error.
#[derive(Default)]
pub struct BrokenRegistry;

impl RegistryStore for BrokenRegistry {
    fn init_schema(&self) -> Result<(), TenantError> {
        Ok(())
    }

    fn save(&self, _record: &TenantRecord) -> Result<(), TenantError> {
        Err(TenantError::QueryFailed("connection reset".to_string()))
    }

    fn get(&self, _username: &Username) -> Result<Option<TenantRecord>, TenantError> {
        Ok(None)
    }

    fn list(&self) -> Result<Vec<TenantRecord>, TenantError> {
        Ok(Vec::new())
    }
}

// ============================================================================
// SECTION: Observer
// ============================================================================

/// Observer that keeps every event.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingObserver {
    pub fn labels(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| match event {
                LifecycleEvent::TenantProvisioned {
                    ..
                } => "provisioned",
                LifecycleEvent::RegistrationFailed {
                    ..
                } => "registration_failed",
                LifecycleEvent::PoolCreated {
                    ..
                } => "pool_created",
                LifecycleEvent::PoolCreationFailed {
                    ..
                } => "pool_failed",
                LifecycleEvent::PoolEvicted {
                    ..
                } => "pool_evicted",
            })
            .collect()
    }
}

impl LifecycleObserver for RecordingObserver {
    fn on_event(&self, event: &LifecycleEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Service Harness
// ============================================================================

/// Service wired to fakes plus handles to inspect them.
pub struct Harness {
    pub service: TenantService<FakeFactory>,
    pub runtime: Arc<FakeRuntime>,
    pub registry: InMemoryRegistryStore,
    pub observer: Arc<RecordingObserver>,
}

pub fn harness_with(
    runtime: FakeRuntime,
    factory: FakeFactory,
    config: TenantServiceConfig,
) -> Harness {
    let runtime = Arc::new(runtime);
    let registry = InMemoryRegistryStore::new();
    let observer = Arc::new(RecordingObserver::default());
    let ports = PortAllocator::new(
        PortRange::new(50_000, 50_031).unwrap(),
        PortCheck::Unchecked,
        64,
    );
    let pools = PoolRegistry::new(factory, 8).with_observer(observer.clone());
    let service = TenantService::new(
        config,
        SharedRegistryStore::from_store(registry.clone()),
        runtime.clone(),
        runtime.clone(),
        ports,
        pools,
    )
    .with_observer(observer.clone());
    Harness {
        service,
        runtime,
        registry,
        observer,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeRuntime::default(), FakeFactory::new(), TenantServiceConfig::default())
}
