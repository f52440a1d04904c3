//! Registry statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Subscriptions created over the registry's lifetime.
    pub created: u64,
    /// Subscriptions torn down over the registry's lifetime.
    pub detached: u64,
    /// Subscriptions currently live.
    pub active: usize,
    /// Subscribers with at least one live subscription.
    pub subscribers: usize,
}

/// Lifetime counters.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    created: AtomicU64,
    detached: AtomicU64,
}

impl Counters {
    pub(crate) fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_detached(&self, count: u64) {
        self.detached.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    pub(crate) fn detached(&self) -> u64 {
        self.detached.load(Ordering::Relaxed)
    }
}
