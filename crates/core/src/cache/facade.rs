//! The cache facade: the only way callers touch either tier.
//!
//! Reads go memory first, then persistent, promoting persistent hits. Writes
//! go persistent first and only reach memory once the row is durable. Every
//! failure is reported to the diagnostic sink and turned into a miss, `false`
//! or zero; nothing here returns an error to the caller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::connection::PersistentTier;
use super::entries::{Entry, PersistentStats};
use super::key::{Fingerprint, compute_fingerprint, normalize_query};
use super::memory::{MemoryRecord, MemoryTier};
use crate::clock::{Clock, SystemClock};
use crate::codec::Codec;
use crate::config::CacheConfig;
use crate::diagnostics::{CacheEvent, DiagnosticSink, TracingSink};

/// Point-in-time view of the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CacheStats {
    /// Persisted rows that are still live.
    pub valid_count: u64,
    /// Persisted rows past their expiry that have not been swept yet.
    pub expired_count: u64,
    /// Entries currently held in the memory tier.
    pub memory_size: usize,
    /// Mean access count over live rows, rounded to 2 places. A row starts
    /// at 1 when stored and gains 1 per persistent-tier read.
    pub avg_access_count: f64,
    /// Heuristic `valid / (valid + 1)`.
    ///
    /// Approaches 1.0 for any non-empty store. It is NOT an observed hit
    /// ratio; the cache does not count hits.
    pub hit_potential: f64,
    /// True when the persistent store failed to open and the cache is memory-only.
    pub degraded: bool,
}

impl CacheStats {
    fn new(persisted: PersistentStats, memory_size: usize, degraded: bool) -> Self {
        let valid = persisted.valid_count as f64;
        Self {
            valid_count: persisted.valid_count,
            expired_count: persisted.expired_count,
            memory_size,
            avg_access_count: (persisted.avg_access_count * 100.0).round() / 100.0,
            hit_potential: valid / (valid + 1.0),
            degraded,
        }
    }
}

/// Two-tier cache over a bounded memory map and a SQLite store.
///
/// Memory hits only take the memory lock. A memory miss goes through the
/// write lock before reading SQLite, so persistent reads run one at a time
/// and queue behind pending writes, even for unrelated keys.
pub struct CacheFacade {
    /// `None` once the store failed to open: memory-only for the process lifetime.
    persistent: Option<PersistentTier>,
    memory: Mutex<MemoryTier>,
    /// Serializes every sequence that writes both tiers.
    write_lock: tokio::sync::Mutex<()>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
    default_ttl: i64,
}

impl std::fmt::Debug for CacheFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFacade")
            .field("persistent", &self.persistent)
            .field("memory_size", &self.memory().len())
            .field("clock", &self.clock)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl CacheFacade {
    /// Open the cache described by `config` with the system clock and
    /// `tracing` diagnostics.
    pub async fn open(config: &CacheConfig) -> Self {
        Self::open_with(config, Arc::new(SystemClock), Arc::new(TracingSink)).await
    }

    /// Open the cache with an explicit clock and sink.
    ///
    /// Never fails: if the store cannot be opened the failure is reported as
    /// [`CacheEvent::Degraded`] and the cache runs memory-only. A
    /// `default_ttl_secs` of 0 is treated as 1 second.
    pub async fn open_with(config: &CacheConfig, clock: Arc<dyn Clock>, sink: Arc<dyn DiagnosticSink>) -> Self {
        let persistent = match PersistentTier::open(&config.db_path).await {
            Ok(tier) => Some(tier),
            Err(e) => {
                sink.record(CacheEvent::Degraded { error: e.to_string() });
                None
            }
        };
        Self::from_parts(persistent, config, clock, sink)
    }

    /// Open the cache over an in-memory SQLite store.
    pub async fn open_in_memory_with(
        config: &CacheConfig, clock: Arc<dyn Clock>, sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let persistent = match PersistentTier::open_in_memory().await {
            Ok(tier) => Some(tier),
            Err(e) => {
                sink.record(CacheEvent::Degraded { error: e.to_string() });
                None
            }
        };
        Self::from_parts(persistent, config, clock, sink)
    }

    fn from_parts(
        persistent: Option<PersistentTier>, config: &CacheConfig, clock: Arc<dyn Clock>, sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            persistent,
            memory: Mutex::new(MemoryTier::new(config.max_memory_items, config.eviction_headroom)),
            write_lock: tokio::sync::Mutex::new(()),
            clock,
            sink,
            default_ttl: ttl_to_secs(config.default_ttl_secs.max(1)),
        }
    }

    /// Whether the cache is running without its persistent tier.
    pub fn is_degraded(&self) -> bool {
        self.persistent.is_none()
    }

    fn memory(&self) -> MutexGuard<'_, MemoryTier> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_evictions(&self, count: usize) {
        if count > 0 {
            self.sink.record(CacheEvent::Evicted { count });
        }
    }

    /// Look up the value cached for `raw_query` in `namespace`.
    pub async fn get(&self, raw_query: &str, namespace: &str) -> Option<Bytes> {
        let fingerprint = compute_fingerprint(raw_query, namespace);

        let hit = self.memory().get(&fingerprint, self.clock.now());
        if let Some(value) = hit {
            self.sink.record(CacheEvent::MemoryHit { fingerprint });
            return Some(value);
        }

        let Some(persistent) = &self.persistent else {
            self.sink.record(CacheEvent::Miss { fingerprint });
            return None;
        };

        // Promotion writes memory, so it must not interleave with a put or
        // invalidate of the same key.
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();

        let hit = self.memory().get(&fingerprint, now);
        if let Some(value) = hit {
            self.sink.record(CacheEvent::MemoryHit { fingerprint });
            return Some(value);
        }

        match persistent.get(&fingerprint, now).await {
            Ok(Some(entry)) => {
                let record = MemoryRecord {
                    fingerprint: entry.fingerprint,
                    namespace: entry.namespace,
                    value: entry.value.clone(),
                    expires_at: entry.expires_at,
                };
                let evicted = self.memory().put(record, now);
                self.record_evictions(evicted);
                self.sink.record(CacheEvent::PersistentHit { fingerprint });
                Some(entry.value)
            }
            Ok(None) => {
                self.sink.record(CacheEvent::Miss { fingerprint });
                None
            }
            Err(e) => {
                self.sink.record(CacheEvent::ReadFailed { operation: "get", error: e.to_string() });
                None
            }
        }
    }

    /// Cache `value` for `raw_query` in `namespace`.
    ///
    /// `ttl_secs` of `None` or `Some(0)` means the configured default. Returns
    /// false, with no side effect, for an empty value or a failed durable write.
    pub async fn put(&self, raw_query: &str, value: impl Into<Bytes>, namespace: &str, ttl_secs: Option<u64>) -> bool {
        let value = value.into();
        let fingerprint = compute_fingerprint(raw_query, namespace);
        if value.is_empty() {
            self.sink.record(CacheEvent::Rejected { fingerprint, reason: "value must not be empty".into() });
            return false;
        }

        let ttl = match ttl_secs {
            None | Some(0) => self.default_ttl,
            Some(secs) => ttl_to_secs(secs),
        };

        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();
        let expires_at = now.saturating_add(ttl);

        if let Some(persistent) = &self.persistent {
            let entry = Entry {
                fingerprint: fingerprint.clone(),
                namespace: namespace.to_string(),
                query_text: normalize_query(raw_query),
                value: value.clone(),
                created_at: now,
                expires_at,
                access_count: 1,
                last_accessed: now,
            };
            if let Err(e) = persistent.put(&entry).await {
                self.sink.record(CacheEvent::WriteFailed { operation: "put", error: e.to_string() });
                return false;
            }
        }

        let record =
            MemoryRecord { fingerprint: fingerprint.clone(), namespace: namespace.to_string(), value, expires_at };
        let evicted = self.memory().put(record, now);
        self.record_evictions(evicted);
        self.sink.record(CacheEvent::Stored { fingerprint, expires_at });
        true
    }

    /// Remove the entry for `raw_query` in `namespace` from both tiers.
    ///
    /// Returns true iff a persisted row existed (or, memory-only, a memory entry).
    pub async fn invalidate(&self, raw_query: &str, namespace: &str) -> bool {
        let fingerprint = compute_fingerprint(raw_query, namespace);
        let _guard = self.write_lock.lock().await;

        let in_memory = self.memory().remove(&fingerprint);
        let existed = match &self.persistent {
            Some(persistent) => match persistent.delete(&fingerprint).await {
                Ok(existed) => existed,
                Err(e) => {
                    self.sink.record(CacheEvent::WriteFailed { operation: "invalidate", error: e.to_string() });
                    false
                }
            },
            None => in_memory,
        };

        self.sink.record(CacheEvent::Invalidated { fingerprint, existed });
        existed
    }

    /// Empty both tiers. Returns false only if the persistent clear failed;
    /// the memory tier is emptied regardless.
    pub async fn clear_all(&self) -> bool {
        let _guard = self.write_lock.lock().await;
        self.memory().clear();

        if let Some(persistent) = &self.persistent {
            if let Err(e) = persistent.clear().await {
                self.sink.record(CacheEvent::WriteFailed { operation: "clear_all", error: e.to_string() });
                return false;
            }
        }

        self.sink.record(CacheEvent::Cleared);
        true
    }

    /// Counts across both tiers.
    pub async fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let persisted = match &self.persistent {
            Some(persistent) => match persistent.stats(now).await {
                Ok(stats) => stats,
                Err(e) => {
                    self.sink.record(CacheEvent::ReadFailed { operation: "stats", error: e.to_string() });
                    PersistentStats::default()
                }
            },
            None => PersistentStats::default(),
        };

        CacheStats::new(persisted, self.memory().len(), self.is_degraded())
    }

    /// Physically remove expired entries from both tiers.
    ///
    /// Returns the number of persisted rows removed.
    pub async fn sweep_expired(&self) -> u64 {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();
        let from_memory = self.memory().sweep_expired(now) as u64;

        let removed = match &self.persistent {
            Some(persistent) => match persistent.sweep_expired(now).await {
                Ok(count) => count,
                Err(e) => {
                    self.sink.record(CacheEvent::WriteFailed { operation: "sweep_expired", error: e.to_string() });
                    return 0;
                }
            },
            None => from_memory,
        };

        self.sink.record(CacheEvent::Purged { removed });
        removed
    }

    /// Remove every entry in `namespace` from both tiers.
    ///
    /// Returns the number of persisted rows removed.
    pub async fn purge_namespace(&self, namespace: &str) -> u64 {
        let _guard = self.write_lock.lock().await;
        let from_memory = self.memory().remove_namespace(namespace) as u64;

        let removed = match &self.persistent {
            Some(persistent) => match persistent.purge_namespace(namespace).await {
                Ok(fingerprints) => fingerprints.len() as u64,
                Err(e) => {
                    self.sink.record(CacheEvent::WriteFailed { operation: "purge_namespace", error: e.to_string() });
                    return 0;
                }
            },
            None => from_memory,
        };

        self.sink.record(CacheEvent::Purged { removed });
        removed
    }

    /// Trim the persistent tier to its `max_entries` most recently accessed
    /// rows, dropping the purged keys from memory too.
    ///
    /// Returns the number of persisted rows removed; always 0 when memory-only.
    pub async fn purge_lru(&self, max_entries: usize) -> u64 {
        let Some(persistent) = &self.persistent else {
            return 0;
        };
        let _guard = self.write_lock.lock().await;

        let fingerprints: Vec<Fingerprint> = match persistent.purge_lru(max_entries).await {
            Ok(fingerprints) => fingerprints,
            Err(e) => {
                self.sink.record(CacheEvent::WriteFailed { operation: "purge_lru", error: e.to_string() });
                return 0;
            }
        };

        {
            let mut memory = self.memory();
            for fingerprint in &fingerprints {
                memory.remove(fingerprint);
            }
        }

        let removed = fingerprints.len() as u64;
        self.sink.record(CacheEvent::Purged { removed });
        removed
    }

    /// Typed [`get`](Self::get): decodes the cached payload with `codec`.
    ///
    /// A payload that fails to decode is reported and treated as a miss.
    pub async fn get_as<T, C>(&self, codec: &C, raw_query: &str, namespace: &str) -> Option<T>
    where
        T: DeserializeOwned,
        C: Codec,
    {
        let payload = self.get(raw_query, namespace).await?;
        match codec.decode(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                self.sink.record(CacheEvent::ReadFailed { operation: "decode", error: e.to_string() });
                None
            }
        }
    }

    /// Typed [`put`](Self::put): encodes `value` with `codec` first.
    pub async fn put_as<T, C>(
        &self, codec: &C, raw_query: &str, value: &T, namespace: &str, ttl_secs: Option<u64>,
    ) -> bool
    where
        T: Serialize,
        C: Codec,
    {
        let payload = match codec.encode(value) {
            Ok(payload) => payload,
            Err(e) => {
                self.sink.record(CacheEvent::WriteFailed { operation: "encode", error: e.to_string() });
                return false;
            }
        };
        self.put(raw_query, payload, namespace, ttl_secs).await
    }
}

fn ttl_to_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::codec::JsonCodec;
    use crate::diagnostics::RecordingSink;

    const START: i64 = 1_700_000_000;

    async fn setup_with(config: CacheConfig) -> (CacheFacade, Arc<ManualClock>, Arc<RecordingSink>) {
        let clock = Arc::new(ManualClock::new(START));
        let sink = Arc::new(RecordingSink::default());
        let cache = CacheFacade::open_in_memory_with(&config, clock.clone(), sink.clone()).await;
        (cache, clock, sink)
    }

    async fn setup() -> (CacheFacade, Arc<ManualClock>, Arc<RecordingSink>) {
        setup_with(CacheConfig::default()).await
    }

    #[tokio::test]
    async fn test_put_then_get_returns_value() {
        let (cache, _, _) = setup().await;
        let payload = br#"[{"url":"https://example.com/login.php"}]"#.to_vec();

        assert!(cache.put("inurl:login.php", payload.clone(), "google", None).await);
        assert_eq!(cache.get("inurl:login.php", "google").await, Some(Bytes::from(payload)));
    }

    #[tokio::test]
    async fn test_get_unknown_key_misses() {
        let (cache, _, sink) = setup().await;

        assert_eq!(cache.get("never stored", "google").await, None);
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::Miss { .. })), 1);
    }

    #[tokio::test]
    async fn test_empty_value_is_rejected_without_side_effect() {
        let (cache, _, sink) = setup().await;
        assert!(cache.put("q", "original", "ns", None).await);

        assert!(!cache.put("q", "", "ns", None).await);

        assert_eq!(cache.get("q", "ns").await, Some(Bytes::from("original")));
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::Rejected { .. })), 1);
    }

    #[tokio::test]
    async fn test_ttl_expiry_is_lazy() {
        let (cache, clock, _) = setup().await;
        assert!(cache.put("q", "v", "ns", Some(5)).await);

        clock.advance(4);
        assert_eq!(cache.get("q", "ns").await, Some(Bytes::from("v")));

        clock.set(START + 6);
        assert_eq!(cache.get("q", "ns").await, None);

        // The row is still on disk until swept.
        let stats = cache.stats().await;
        assert_eq!(stats.valid_count, 0);
        assert_eq!(stats.expired_count, 1);
        assert_eq!(stats.memory_size, 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_uses_default() {
        let config = CacheConfig { default_ttl_secs: 100, ..Default::default() };
        let (cache, clock, _) = setup_with(config).await;
        assert!(cache.put("q", "v", "ns", Some(0)).await);

        clock.advance(99);
        assert!(cache.get("q", "ns").await.is_some());
        clock.advance(1);
        assert!(cache.get("q", "ns").await.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_is_last_writer_wins() {
        let (cache, _, _) = setup().await;
        cache.put("q", "first", "ns", None).await;
        cache.put("Q", "second", "ns", None).await;

        assert_eq!(cache.get("q", "ns").await, Some(Bytes::from("second")));
        assert_eq!(cache.stats().await.valid_count, 1);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (cache, _, _) = setup().await;
        assert!(!cache.invalidate("q", "ns").await);

        cache.put("q", "v", "ns", None).await;
        assert!(cache.invalidate("q", "ns").await);
        assert_eq!(cache.get("q", "ns").await, None);
        assert!(!cache.invalidate("q", "ns").await);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let (cache, _, _) = setup().await;
        cache.put("foo", "from A", "A", None).await;
        cache.put("foo", "from B", "B", None).await;

        assert_eq!(cache.get("foo", "A").await, Some(Bytes::from("from A")));
        assert_eq!(cache.get("foo", "B").await, Some(Bytes::from("from B")));

        cache.invalidate("foo", "A").await;
        assert_eq!(cache.get("foo", "B").await, Some(Bytes::from("from B")));
    }

    #[tokio::test]
    async fn test_normalized_queries_share_an_entry() {
        let (cache, _, _) = setup().await;
        cache.put("Foo   Bar", "v", "ns", None).await;

        assert_eq!(cache.get("foo bar", "ns").await, Some(Bytes::from("v")));
        assert_eq!(cache.get("\"FOO\" 'bar'", "ns").await, Some(Bytes::from("v")));
    }

    #[tokio::test]
    async fn test_stats_counts_valid_and_expired() {
        let (cache, clock, _) = setup().await;
        for q in ["a", "b", "c"] {
            cache.put(q, "v", "ns", Some(3600)).await;
        }
        for q in ["d", "e"] {
            cache.put(q, "v", "ns", Some(10)).await;
        }
        clock.advance(20);

        let stats = cache.stats().await;
        assert_eq!(stats.valid_count, 3);
        assert_eq!(stats.expired_count, 2);
        assert_eq!(stats.memory_size, 5);
        assert!((stats.hit_potential - 0.75).abs() < f64::EPSILON);
        assert!(!stats.degraded);
    }

    #[tokio::test]
    async fn test_stats_on_empty_cache() {
        let (cache, _, _) = setup().await;
        let stats = cache.stats().await;
        assert_eq!(stats, CacheStats::default());
    }

    #[tokio::test]
    async fn test_persistent_hit_is_promoted() {
        let (cache, _, sink) = setup().await;
        cache.put("q", "v", "ns", None).await;
        cache.memory().clear();

        assert_eq!(cache.get("q", "ns").await, Some(Bytes::from("v")));
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::PersistentHit { .. })), 1);
        assert!(cache.memory().contains(&compute_fingerprint("q", "ns")));

        assert_eq!(cache.get("q", "ns").await, Some(Bytes::from("v")));
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::MemoryHit { .. })), 1);
    }

    #[tokio::test]
    async fn test_persistent_reads_bump_access_count() {
        let (cache, _, _) = setup().await;
        cache.put("q", "v", "ns", None).await;
        assert!((cache.stats().await.avg_access_count - 1.0).abs() < f64::EPSILON);

        cache.memory().clear();
        cache.get("q", "ns").await;
        cache.memory().clear();
        cache.get("q", "ns").await;

        assert!((cache.stats().await.avg_access_count - 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_unvalidated_zero_default_ttl_still_stores() {
        let config = CacheConfig { default_ttl_secs: 0, ..Default::default() };
        let (cache, clock, _) = setup_with(config).await;

        assert!(cache.put("q", "v", "ns", None).await);
        assert_eq!(cache.get("q", "ns").await, Some(Bytes::from("v")));

        clock.advance(1);
        assert_eq!(cache.get("q", "ns").await, None);
    }

    #[tokio::test]
    async fn test_memory_tier_stays_bounded() {
        let config = CacheConfig { max_memory_items: 10, eviction_headroom: 2, ..Default::default() };
        let (cache, _, sink) = setup_with(config).await;
        for i in 0..11 {
            assert!(cache.put(&format!("q{i}"), "v", "ns", None).await);
        }

        let stats = cache.stats().await;
        assert_eq!(stats.memory_size, 8);
        assert_eq!(stats.valid_count, 11);
        assert_eq!(sink.count(|e| *e == CacheEvent::Evicted { count: 3 }), 1);

        // Evicted keys are still served from the persistent tier.
        assert_eq!(cache.get("q0", "ns").await, Some(Bytes::from("v")));
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (cache, _, _) = setup().await;
        cache.put("a", "v", "ns", None).await;
        cache.put("b", "v", "other", None).await;

        assert!(cache.clear_all().await);

        assert_eq!(cache.get("a", "ns").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.valid_count, 0);
        assert_eq!(stats.memory_size, 0);
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let (cache, clock, _) = setup().await;
        cache.put("short", "v", "ns", Some(5)).await;
        cache.put("long", "v", "ns", Some(500)).await;
        clock.advance(10);

        assert_eq!(cache.sweep_expired().await, 1);

        let stats = cache.stats().await;
        assert_eq!(stats.expired_count, 0);
        assert_eq!(stats.valid_count, 1);
        assert_eq!(stats.memory_size, 1);
    }

    #[tokio::test]
    async fn test_purge_namespace() {
        let (cache, _, _) = setup().await;
        cache.put("https://example.com/a", "<html>a</html>", "web_content", None).await;
        cache.put("https://example.com/b", "<html>b</html>", "web_content", None).await;
        cache.put("site:example.com", "[]", "google", None).await;

        assert_eq!(cache.purge_namespace("web_content").await, 2);

        assert_eq!(cache.get("https://example.com/a", "web_content").await, None);
        assert!(cache.get("site:example.com", "google").await.is_some());
    }

    #[tokio::test]
    async fn test_purge_lru_drops_memory_copies() {
        let (cache, clock, _) = setup().await;
        cache.put("old", "v", "ns", None).await;
        clock.advance(1);
        cache.put("new", "v", "ns", None).await;

        assert_eq!(cache.purge_lru(1).await, 1);

        assert_eq!(cache.get("old", "ns").await, None);
        assert!(cache.get("new", "ns").await.is_some());
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let (cache, _, _) = setup().await;
        let results = vec!["https://a.example".to_string(), "https://b.example".to_string()];

        assert!(cache.put_as(&JsonCodec, "filetype:pdf", &results, "duckduckgo", None).await);

        let cached: Option<Vec<String>> = cache.get_as(&JsonCodec, "filetype:pdf", "duckduckgo").await;
        assert_eq!(cached, Some(results));
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_a_miss() {
        let (cache, _, sink) = setup().await;
        cache.put("q", "not json", "ns", None).await;

        let cached: Option<Vec<String>> = cache.get_as(&JsonCodec, "q", "ns").await;
        assert_eq!(cached, None);
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::ReadFailed { operation: "decode", .. })), 1);
    }

    #[tokio::test]
    async fn test_entries_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig { db_path: dir.path().join("cache").join("search_cache.sqlite"), ..Default::default() };
        let clock = Arc::new(ManualClock::new(START));

        {
            let cache = CacheFacade::open_with(&config, clock.clone(), Arc::new(RecordingSink::default())).await;
            assert!(!cache.is_degraded());
            assert!(cache.put("persist me", "v", "ns", None).await);
        }

        let sink = Arc::new(RecordingSink::default());
        let reopened = CacheFacade::open_with(&config, clock.clone(), sink.clone()).await;
        assert_eq!(reopened.get("persist me", "ns").await, Some(Bytes::from("v")));
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::PersistentHit { .. })), 1);
    }

    #[tokio::test]
    async fn test_unopenable_store_degrades_to_memory_only() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let config = CacheConfig { db_path: blocker.path().join("search_cache.sqlite"), ..Default::default() };
        let sink = Arc::new(RecordingSink::default());

        let cache = CacheFacade::open_with(&config, Arc::new(ManualClock::new(START)), sink.clone()).await;

        assert!(cache.is_degraded());
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::Degraded { .. })), 1);
        assert!(cache.put("q", "v", "ns", None).await);
        assert_eq!(cache.get("q", "ns").await, Some(Bytes::from("v")));
        assert!(cache.stats().await.degraded);
        assert!(cache.invalidate("q", "ns").await);
        assert_eq!(cache.get("q", "ns").await, None);
        assert!(cache.clear_all().await);
    }

    #[tokio::test]
    async fn test_store_failures_surface_as_miss_or_false() {
        let (cache, _, sink) = setup().await;
        assert!(cache.put("kept", "v", "ns", None).await);
        cache.memory().clear();

        let persistent = cache.persistent.as_ref().unwrap();
        persistent.conn.call(|conn| conn.execute_batch("DROP TABLE cache_entries")).await.unwrap();

        assert!(!cache.put("q", "v", "ns", None).await);
        assert_eq!(cache.memory().len(), 0);
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::WriteFailed { operation: "put", .. })), 1);
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::Stored { .. })), 1);

        assert_eq!(cache.get("kept", "ns").await, None);
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::ReadFailed { operation: "get", .. })), 1);

        assert!(!cache.invalidate("kept", "ns").await);
        assert!(!cache.clear_all().await);
        assert_eq!(sink.count(|e| matches!(e, CacheEvent::WriteFailed { .. })), 3);

        let stats = cache.stats().await;
        assert_eq!(stats.valid_count, 0);
        assert!(!stats.degraded);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_leave_one_consistent_value() {
        let (cache, _, _) = setup().await;
        let cache = Arc::new(cache);
        let written: Vec<String> = (0..16).map(|i| format!("value-{i}")).collect();

        let mut handles = Vec::new();
        for value in written.clone() {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.put("shared key", value, "ns", None).await }));
        }
        for _ in 0..16 {
            let cache = cache.clone();
            let written = written.clone();
            handles.push(tokio::spawn(async move {
                if let Some(seen) = cache.get("shared key", "ns").await {
                    let seen = String::from_utf8(seen.to_vec()).unwrap();
                    assert!(written.contains(&seen), "torn value observed: {seen}");
                }
                true
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        let fingerprint = compute_fingerprint("shared key", "ns");
        let from_memory = cache.memory().get(&fingerprint, START).unwrap();
        let from_disk = cache.persistent.as_ref().unwrap().get(&fingerprint, START).await.unwrap().unwrap();
        assert_eq!(from_memory, from_disk.value);
        assert!(written.contains(&String::from_utf8(from_disk.value.to_vec()).unwrap()));
        assert_eq!(cache.stats().await.valid_count, 1);
    }
}
