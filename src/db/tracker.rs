//! In-flight connection accounting for shutdown.
//!
//! Connections are owned by the tool call that opened them, so shutdown cannot
//! close them directly. Instead each call holds an `OpenConnectionGuard` from
//! before it starts connecting until its connection is closed, and shutdown
//! waits until none remain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct TrackerState {
    next_id: AtomicU64,
    /// Target (`host:port/database`) per in-flight call
    open: Mutex<HashMap<u64, String>>,
    released: Notify,
}

impl TrackerState {
    fn open(&self) -> MutexGuard<'_, HashMap<u64, String>> {
        // The map is only touched by insert/remove, so a poisoned lock still holds valid data
        self.open.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Counts calls that are connecting to, or holding, a database connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    state: Arc<TrackerState>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call about to connect to `target`. Dropping the guard unregisters it.
    pub fn track(&self, target: impl Into<String>) -> OpenConnectionGuard {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.open().insert(id, target.into());
        OpenConnectionGuard {
            id,
            state: self.state.clone(),
        }
    }

    /// Number of connections currently connecting or open.
    pub fn open_count(&self) -> usize {
        self.state.open().len()
    }

    /// Targets of connections currently connecting or open, sorted.
    pub fn open_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.state.open().values().cloned().collect();
        targets.sort();
        targets
    }

    /// Wait until no connections are open.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub async fn wait_until_closed(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_idle()).await.is_ok()
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.state.released.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed
            notified.as_mut().enable();
            if self.open_count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks one in-flight connection.
#[derive(Debug)]
pub struct OpenConnectionGuard {
    id: u64,
    state: Arc<TrackerState>,
}

impl Drop for OpenConnectionGuard {
    fn drop(&mut self) {
        self.state.open().remove(&self.id);
        self.state.released.notify_waiters();
    }
}
