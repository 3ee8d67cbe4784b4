//! Two-tier memoization cache for search results and fetched pages.
//!
//! Callers only ever use [`CacheFacade`]. Behind it sit:
//!
//! - Fingerprinting of normalized `namespace:query` keys (SHA-256)
//! - A bounded memory tier with batched LRU eviction
//! - A SQLite persistent tier (WAL mode, versioned migrations) with TTL
//!   bookkeeping and access statistics
//! - Several purge strategies (expired, namespace, LRU)

pub mod connection;
pub mod entries;
pub mod facade;
pub mod key;
pub mod memory;
pub mod migrations;

pub use crate::Error;

pub use connection::PersistentTier;
pub use entries::{Entry, PersistentStats};
pub use facade::{CacheFacade, CacheStats};
pub use key::{Fingerprint, compute_fingerprint, normalize_query};
pub use memory::{MemoryRecord, MemoryTier};
