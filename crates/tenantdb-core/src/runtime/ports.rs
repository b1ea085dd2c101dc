// crates/tenantdb-core/src/runtime/ports.rs
// ============================================================================
// Module: Port Allocator
// Description: Host port selection for tenant containers.
// Purpose: Hand out ports that no live tenant container already owns.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! The allocator picks from the dynamic port range starting at a random
//! offset and skips ports it already handed out. With [`PortCheck::Bind`] it
//! also skips ports some other process currently holds.
//!
//! Known limitation: a port that passes the bind check can still be taken by
//! another process before the container runtime binds it. Container creation
//! then fails and the caller releases the port.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::net::SocketAddrV4;
use std::net::TcpListener;
use std::sync::Mutex;

use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

use crate::core::TenantError;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default attempt budget per allocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 256;

/// Inclusive host port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    /// First port in the range.
    pub start: u16,
    /// Last port in the range.
    pub end: u16,
}

impl PortRange {
    /// Builds a range, rejecting empty or privileged ranges.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Validation`] when `start > end` or `start < 1024`.
    pub fn new(start: u16, end: u16) -> Result<Self, TenantError> {
        if start > end {
            return Err(TenantError::Validation(format!("port range {start}-{end} is empty")));
        }
        if start < 1024 {
            return Err(TenantError::Validation(format!(
                "port range must not include privileged ports (start {start})"
            )));
        }
        Ok(Self {
            start,
            end,
        })
    }

    /// Number of ports in the range.
    #[must_use]
    pub fn len(self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }

    /// Always false; ranges hold at least one port.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Returns true when the port falls inside the range.
    #[must_use]
    pub const fn contains(self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }

    /// Returns the port at `offset` from the start, wrapping around.
    fn nth(self, offset: u32) -> u16 {
        let index = offset % self.len();
        u16::try_from(u32::from(self.start) + index).unwrap_or(self.end)
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            start: 49_152,
            end: 65_535,
        }
    }
}

/// Liveness check applied to candidate ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortCheck {
    /// Only the in-use set is consulted.
    Unchecked,
    /// Also try binding `0.0.0.0:port` and skip ports that fail.
    #[default]
    Bind,
}

// ============================================================================
// SECTION: Allocator
// ============================================================================

/// Host port allocator with an in-use set.
#[derive(Debug)]
pub struct PortAllocator {
    /// Candidate range.
    range: PortRange,
    /// Liveness check.
    check: PortCheck,
    /// Attempt budget per allocation.
    max_attempts: u32,
    /// Ports handed out and not released.
    in_use: Mutex<BTreeSet<u16>>,
}

impl PortAllocator {
    /// Creates an allocator over `range`.
    #[must_use]
    pub fn new(range: PortRange, check: PortCheck, max_attempts: u32) -> Self {
        Self {
            range,
            check,
            max_attempts: max_attempts.max(1),
            in_use: Mutex::new(BTreeSet::new()),
        }
    }

    /// Picks a free port and marks it in use.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::CreationFailed`] when no free port is found
    /// within the attempt budget.
    pub fn allocate(&self) -> Result<u16, TenantError> {
        let start = rand::thread_rng().gen_range(0..self.range.len());
        let attempts = self.max_attempts.min(self.range.len());
        let mut in_use = self
            .in_use
            .lock()
            .map_err(|_| TenantError::CreationFailed("port allocator mutex poisoned".to_string()))?;
        for step in 0..attempts {
            let port = self.range.nth(start.wrapping_add(step));
            if in_use.contains(&port) {
                continue;
            }
            if self.check == PortCheck::Bind && !port_is_bindable(port) {
                continue;
            }
            in_use.insert(port);
            return Ok(port);
        }
        Err(TenantError::CreationFailed(format!(
            "no free port in {}-{} after {attempts} attempts",
            self.range.start, self.range.end
        )))
    }

    /// Returns a port to the free set.
    pub fn release(&self, port: u16) {
        if let Ok(mut in_use) = self.in_use.lock() {
            in_use.remove(&port);
        }
    }

    /// Records a port already owned by a registered tenant.
    pub fn mark_in_use(&self, port: u16) {
        if let Ok(mut in_use) = self.in_use.lock() {
            in_use.insert(port);
        }
    }

    /// Number of ports currently marked in use.
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.in_use.lock().map(|set| set.len()).unwrap_or_default()
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new(PortRange::default(), PortCheck::default(), DEFAULT_MAX_ATTEMPTS)
    }
}

/// Returns true when nothing else holds the port on all interfaces.
fn port_is_bindable(port: u16) -> bool {
    TcpListener::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)).is_ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use std::collections::BTreeSet;
    use std::net::TcpListener;

    use super::PortAllocator;
    use super::PortCheck;
    use super::PortRange;
    use crate::core::TenantError;

    #[test]
    fn range_rejects_inverted_and_privileged() {
        assert!(PortRange::new(60_000, 50_000).is_err());
        assert!(PortRange::new(80, 2_000).is_err());
        assert_eq!(PortRange::new(50_000, 50_009).unwrap().len(), 10);
    }

    #[test]
    fn allocations_never_repeat_until_released() {
        let range = PortRange::new(50_000, 50_015).unwrap();
        let allocator = PortAllocator::new(range, PortCheck::Unchecked, 64);
        let mut seen = BTreeSet::new();
        for _ in 0..16 {
            let port = allocator.allocate().unwrap();
            assert!(range.contains(port));
            assert!(seen.insert(port), "port {port} handed out twice");
        }
        let exhausted = allocator.allocate().unwrap_err();
        assert!(matches!(exhausted, TenantError::CreationFailed(_)));

        let released = *seen.iter().next().unwrap();
        allocator.release(released);
        assert_eq!(allocator.allocate().unwrap(), released);
    }

    #[test]
    fn marked_ports_are_skipped() {
        let range = PortRange::new(50_100, 50_101).unwrap();
        let allocator = PortAllocator::new(range, PortCheck::Unchecked, 8);
        allocator.mark_in_use(50_100);
        assert_eq!(allocator.allocate().unwrap(), 50_101);
        assert_eq!(allocator.in_use_count(), 2);
    }

    #[test]
    fn bind_check_skips_ports_held_elsewhere() {
        let listener = TcpListener::bind("0.0.0.0:0").unwrap();
        let held = listener.local_addr().unwrap().port();
        let range = PortRange {
            start: held,
            end: held,
        };
        let allocator = PortAllocator::new(range, PortCheck::Bind, 4);
        assert!(matches!(allocator.allocate(), Err(TenantError::CreationFailed(_))));

        let unchecked = PortAllocator::new(range, PortCheck::Unchecked, 4);
        assert_eq!(unchecked.allocate().unwrap(), held);
    }
}
