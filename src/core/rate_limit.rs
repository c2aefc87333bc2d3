//! Per-client fixed-window rate limiting.
//!
//! Each client identity gets a counter that resets at window boundaries.
//! This trades burst-smoothing accuracy for O(1) space per identity, which
//! is enough here: the protected resource (the NocoDB instance) is not
//! sensitive to burst shape.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A single identity's window state.
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_started: Instant,
}

/// Fixed-window rate limiter keyed by client identity.
///
/// Mutation is serialized through a mutex; per-identity ordering only needs
/// to be consistent with wall-clock time, not request arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    quota: u32,
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl RateLimiter {
    /// Create a limiter admitting `quota` calls per `window` per identity.
    pub fn new(window: Duration, quota: u32) -> Self {
        Self {
            window,
            quota,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a call from `identity` is admitted right now.
    ///
    /// Admitted calls increment the identity's counter; rejected calls do
    /// not. The counter never exceeds the quota within a window.
    pub fn allow(&self, identity: &str) -> bool {
        self.allow_at(identity, Instant::now())
    }

    fn allow_at(&self, identity: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry(identity.to_string())
            .or_insert(WindowEntry {
                count: 0,
                window_started: now,
            });

        if now.duration_since(entry.window_started) >= self.window {
            entry.count = 0;
            entry.window_started = now;
        }

        if entry.count >= self.quota {
            false
        } else {
            entry.count += 1;
            true
        }
    }

    /// Drop entries whose window expired more than one full window ago.
    ///
    /// Returns the number of evicted identities. Without this sweep the map
    /// would grow without bound as new identities appear.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        let cutoff = self.window * 2;
        entries.retain(|_, entry| now.duration_since(entry.window_started) < cutoff);
        before - entries.len()
    }

    /// Number of identities currently tracked. Reported by `/status`.
    pub fn tracked_identities(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The configured window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The configured per-window quota.
    pub fn quota(&self) -> u32 {
        self.quota
    }
}
