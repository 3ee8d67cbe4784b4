//! Bounded in-process tier.
//!
//! Eviction is batched: once the tier grows past `max_items` it drops
//! `overflow + headroom` entries in one pass, least recently accessed first,
//! instead of trimming a single entry on every insert at the boundary.

use std::collections::HashMap;

use bytes::Bytes;

use super::key::Fingerprint;

pub const DEFAULT_MAX_ITEMS: usize = 1000;
pub const DEFAULT_HEADROOM: usize = 100;

/// A value to insert into the memory tier.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    pub fingerprint: Fingerprint,
    pub namespace: String,
    pub value: Bytes,
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
struct Slot {
    value: Bytes,
    namespace: String,
    expires_at: i64,
    last_access: i64,
    /// Monotonic insertion order; breaks ties in `last_access`.
    seq: u64,
}

/// Hot cache keyed by fingerprint. Not synchronized; the facade owns the lock.
#[derive(Debug)]
pub struct MemoryTier {
    slots: HashMap<Fingerprint, Slot>,
    max_items: usize,
    headroom: usize,
    next_seq: u64,
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS, DEFAULT_HEADROOM)
    }
}

impl MemoryTier {
    pub fn new(max_items: usize, headroom: usize) -> Self {
        Self { slots: HashMap::new(), max_items, headroom, next_seq: 0 }
    }

    /// Look up a live value, refreshing its recency.
    ///
    /// An entry found expired is removed on the spot.
    pub fn get(&mut self, fingerprint: &Fingerprint, now: i64) -> Option<Bytes> {
        match self.slots.get_mut(fingerprint) {
            Some(slot) if slot.expires_at > now => {
                slot.last_access = now;
                return Some(slot.value.clone());
            }
            Some(_) => {}
            None => return None,
        }
        self.slots.remove(fingerprint);
        None
    }

    /// Insert or overwrite one entry, then enforce capacity.
    ///
    /// Returns the number of entries evicted.
    pub fn put(&mut self, record: MemoryRecord, now: i64) -> usize {
        self.insert(record, now);
        self.evict_if_over_capacity()
    }

    /// Insert several entries, enforcing capacity once at the end.
    ///
    /// Returns the number of entries evicted.
    pub fn put_batch(&mut self, records: impl IntoIterator<Item = MemoryRecord>, now: i64) -> usize {
        for record in records {
            self.insert(record, now);
        }
        self.evict_if_over_capacity()
    }

    fn insert(&mut self, record: MemoryRecord, now: i64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(
            record.fingerprint,
            Slot {
                value: record.value,
                namespace: record.namespace,
                expires_at: record.expires_at,
                last_access: now,
                seq,
            },
        );
    }

    /// Drop `overflow + headroom` entries, oldest access first, when over
    /// capacity. Returns the number of entries evicted.
    pub fn evict_if_over_capacity(&mut self) -> usize {
        let len = self.slots.len();
        if len <= self.max_items {
            return 0;
        }

        let count = (len - self.max_items + self.headroom).min(len);
        let mut order: Vec<(i64, u64, Fingerprint)> = self
            .slots
            .iter()
            .map(|(fp, slot)| (slot.last_access, slot.seq, fp.clone()))
            .collect();
        order.sort_unstable();

        for (_, _, fingerprint) in order.into_iter().take(count) {
            self.slots.remove(&fingerprint);
        }
        count
    }

    /// Remove one entry. Returns whether it was present.
    pub fn remove(&mut self, fingerprint: &Fingerprint) -> bool {
        self.slots.remove(fingerprint).is_some()
    }

    /// Remove every entry belonging to `namespace`. Returns how many were removed.
    pub fn remove_namespace(&mut self, namespace: &str) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.namespace != namespace);
        before - self.slots.len()
    }

    /// Remove every entry with `expires_at <= now`. Returns how many were removed.
    pub fn sweep_expired(&mut self, now: i64) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.expires_at > now);
        before - self.slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.slots.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
