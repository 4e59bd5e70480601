//! Shared daemon state.
//!
//! A single handle holds the shutdown flag; the accept loop, the console,
//! and the signal handlers all observe it. The flag is atomic so readers
//! never take a lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Shared daemon state.
pub type SharedState = Arc<DaemonState>;

/// Process-wide flags and bookkeeping.
pub struct DaemonState {
    shutdown: AtomicBool,
    started_at: DateTime<Utc>,
}

impl Default for DaemonState {
    fn default() -> Self {
        Self::new()
    }
}

impl DaemonState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            started_at: Utc::now(),
        }
    }

    /// Builds the shared handle.
    #[must_use]
    pub fn shared() -> SharedState {
        Arc::new(Self::new())
    }

    /// True once shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Requests a graceful shutdown. Idempotent.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Seconds since boot.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_flag_flips_once() {
        let state = DaemonState::new();
        assert!(!state.is_shutdown_requested());
        state.request_shutdown();
        assert!(state.is_shutdown_requested());
        state.request_shutdown();
        assert!(state.is_shutdown_requested());
    }
}
