//! Diagnostic events emitted by the cache facade.
//!
//! The facade never logs through a global directly. It hands every event to a
//! [`DiagnosticSink`] chosen at construction: [`TracingSink`] forwards to
//! `tracing`, [`RecordingSink`] keeps events in memory so tests can assert on
//! them.

use std::sync::{Mutex, PoisonError};

use crate::cache::Fingerprint;

/// Something worth reporting that happened inside the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    MemoryHit { fingerprint: Fingerprint },
    PersistentHit { fingerprint: Fingerprint },
    Miss { fingerprint: Fingerprint },
    Stored { fingerprint: Fingerprint, expires_at: i64 },
    /// A `put` was refused before touching either tier.
    Rejected { fingerprint: Fingerprint, reason: String },
    Invalidated { fingerprint: Fingerprint, existed: bool },
    Evicted { count: usize },
    Cleared,
    Purged { removed: u64 },
    /// The persistent store could not be opened; the cache runs memory-only.
    Degraded { error: String },
    ReadFailed { operation: &'static str, error: String },
    WriteFailed { operation: &'static str, error: String },
}

/// Receiver for [`CacheEvent`]s.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: CacheEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: CacheEvent) {
        match event {
            CacheEvent::MemoryHit { fingerprint } => tracing::debug!("cache hit (memory) for {}", fingerprint),
            CacheEvent::PersistentHit { fingerprint } => {
                tracing::debug!("cache hit (persistent) for {}", fingerprint)
            }
            CacheEvent::Miss { fingerprint } => tracing::debug!("cache miss for {}", fingerprint),
            CacheEvent::Stored { fingerprint, expires_at } => {
                tracing::debug!(%fingerprint, expires_at, "cached value")
            }
            CacheEvent::Rejected { fingerprint, reason } => {
                tracing::warn!(%fingerprint, "rejected cache write: {}", reason)
            }
            CacheEvent::Invalidated { fingerprint, existed } => {
                tracing::debug!(%fingerprint, existed, "invalidated cache entry")
            }
            CacheEvent::Evicted { count } => tracing::debug!(count, "evicted entries from memory tier"),
            CacheEvent::Cleared => tracing::info!("cleared all cache entries"),
            CacheEvent::Purged { removed } => tracing::info!(removed, "purged cache entries"),
            CacheEvent::Degraded { error } => {
                tracing::error!("failed to open persistent cache, running memory-only: {}", error)
            }
            CacheEvent::ReadFailed { operation, error } => {
                tracing::error!(operation, "failed to read from cache: {}", error)
            }
            CacheEvent::WriteFailed { operation, error } => {
                tracing::error!(operation, "failed to write to cache: {}", error)
            }
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CacheEvent>>,
}

impl RecordingSink {
    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn count(&self, predicate: impl Fn(&CacheEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| predicate(e))
            .count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: CacheEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}
