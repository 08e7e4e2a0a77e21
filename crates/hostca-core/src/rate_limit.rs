// ABOUTME: Per-instance signing cool-down shared by all project workers.
// ABOUTME: Remembers when each instance was last signed; entries live for the process lifetime.

use crate::types::InstanceId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Default minimum time between two signings of the same instance.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(12 * 60 * 60);

/// Tracks the last successful signing per instance.
///
/// Reads take a shared lock and never block each other; a record takes the
/// exclusive lock. The map is never exposed.
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_signed: RwLock<HashMap<InstanceId, Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_signed: RwLock::new(HashMap::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// True if `id` was never signed or its last signing is older than the cool-down.
    pub fn is_signable(&self, id: &InstanceId) -> bool {
        self.is_signable_at(id, Instant::now())
    }

    pub fn is_signable_at(&self, id: &InstanceId, now: Instant) -> bool {
        // Entries are plain timestamps, so a poisoned lock still holds valid data
        let last_signed = self.last_signed.read().unwrap_or_else(PoisonError::into_inner);
        match last_signed.get(id) {
            None => true,
            Some(at) => now.saturating_duration_since(*at) > self.cooldown,
        }
    }

    /// Record a successful signing of `id` now, overwriting any earlier entry.
    pub fn record_signed(&self, id: &InstanceId) {
        self.record_signed_at(id, Instant::now());
    }

    pub fn record_signed_at(&self, id: &InstanceId, at: Instant) {
        let mut last_signed = self
            .last_signed
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        last_signed.insert(id.clone(), at);
    }

    /// Number of instances ever signed by this process.
    pub fn len(&self) -> usize {
        self.last_signed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
