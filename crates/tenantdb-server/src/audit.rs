// crates/tenantdb-server/src/audit.rs
// ============================================================================
// Module: Tenant DB Audit Logging
// Description: Structured audit events for requests and tenant lifecycle.
// Purpose: Emit JSON-line audit records without a logging framework.
// Dependencies: tenantdb-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every HTTP operation produces a [`TenantAuditEvent`]. Lifecycle events
//! raised inside the core (container provisioned, pool built or evicted) reach
//! the same sink through [`AuditObserver`]. Passwords and connection strings
//! are never part of an event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use tenantdb_core::LifecycleEvent;
use tenantdb_core::LifecycleObserver;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Operation succeeded.
    Ok,
    /// Operation failed.
    Error,
}

/// Audit record for one HTTP operation.
#[derive(Debug, Clone, Serialize)]
pub struct TenantAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Operation label (for example `register`, `insert_item`).
    pub operation: &'static str,
    /// Tenant username when the route names one.
    pub username: Option<String>,
    /// Request outcome.
    pub outcome: AuditOutcome,
    /// Error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Handler duration in milliseconds.
    pub duration_ms: u128,
}

/// Inputs required to construct a request audit event.
pub struct TenantAuditEventParams {
    /// Operation label.
    pub operation: &'static str,
    /// Tenant username when known.
    pub username: Option<String>,
    /// Error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Handler duration in milliseconds.
    pub duration_ms: u128,
}

impl TenantAuditEvent {
    /// Creates a request audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: TenantAuditEventParams) -> Self {
        Self {
            event: "tenant_request",
            timestamp_ms: now_ms(),
            operation: params.operation,
            username: params.username,
            outcome: if params.error_kind.is_some() { AuditOutcome::Error } else { AuditOutcome::Ok },
            error_kind: params.error_kind,
            duration_ms: params.duration_ms,
        }
    }
}

/// Audit record for a core lifecycle event.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Lifecycle kind label.
    pub kind: &'static str,
    /// Tenant username.
    pub username: String,
    /// Registration stage for failures.
    pub stage: Option<&'static str>,
    /// Container identifier when provisioned.
    pub container_id: Option<String>,
    /// Host port when provisioned.
    pub host_port: Option<u16>,
    /// Error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Error detail on failure.
    pub error: Option<String>,
}

impl LifecycleAuditEvent {
    /// Converts a core lifecycle event into an audit record.
    #[must_use]
    pub fn from_lifecycle(event: &LifecycleEvent) -> Self {
        let mut record = Self {
            event: "tenant_lifecycle",
            timestamp_ms: now_ms(),
            kind: "",
            username: String::new(),
            stage: None,
            container_id: None,
            host_port: None,
            error_kind: None,
            error: None,
        };
        match event {
            LifecycleEvent::TenantProvisioned {
                username,
                container_id,
                host_port,
            } => {
                record.kind = "tenant_provisioned";
                record.username = username.to_string();
                record.container_id = Some(container_id.clone());
                record.host_port = Some(*host_port);
            }
            LifecycleEvent::RegistrationFailed {
                username,
                stage,
                error,
            } => {
                record.kind = "registration_failed";
                record.username = username.to_string();
                record.stage = Some(*stage);
                record.error_kind = Some(error.kind());
                record.error = Some(error.detail().to_string());
            }
            LifecycleEvent::PoolCreated {
                username,
            } => {
                record.kind = "pool_created";
                record.username = username.to_string();
            }
            LifecycleEvent::PoolCreationFailed {
                username,
                error,
            } => {
                record.kind = "pool_creation_failed";
                record.username = username.to_string();
                record.error_kind = Some(error.kind());
                record.error = Some(error.detail().to_string());
            }
            LifecycleEvent::PoolEvicted {
                username,
            } => {
                record.kind = "pool_evicted";
                record.username = username.to_string();
            }
        }
        record
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for tenant events.
pub trait TenantAuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &TenantAuditEvent);

    /// Record a lifecycle audit event.
    fn record_lifecycle(&self, _event: &LifecycleAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl TenantAuditSink for StderrAuditSink {
    fn record(&self, event: &TenantAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_lifecycle(&self, event: &LifecycleAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized line.
    fn append(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl TenantAuditSink for FileAuditSink {
    fn record(&self, event: &TenantAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_lifecycle(&self, event: &LifecycleAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink used when auditing is disabled.
pub struct NoopAuditSink;

impl TenantAuditSink for NoopAuditSink {
    fn record(&self, _event: &TenantAuditEvent) {}
}

// ============================================================================
// SECTION: Lifecycle Bridge
// ============================================================================

/// Forwards core lifecycle events to an audit sink.
pub struct AuditObserver {
    /// Destination sink.
    sink: Arc<dyn TenantAuditSink>,
}

impl AuditObserver {
    /// Creates an observer writing to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn TenantAuditSink>) -> Self {
        Self {
            sink,
        }
    }
}

impl LifecycleObserver for AuditObserver {
    fn on_event(&self, event: &LifecycleEvent) {
        self.sink.record_lifecycle(&LifecycleAuditEvent::from_lifecycle(event));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
