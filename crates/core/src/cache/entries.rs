//! Persistent tier record operations.
//!
//! One row per fingerprint in `cache_entries`. Reads only ever return rows
//! whose `expires_at` is strictly after the supplied `now`; expired rows stay on
//! disk until [`PersistentTier::sweep_expired`] removes them.

use super::connection::PersistentTier;
use super::key::Fingerprint;
use crate::Error;
use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const SELECT_COLUMNS: &str = "fingerprint, namespace, original_query_text, serialized_value,
    created_at, expires_at, access_count, last_accessed";

/// A persisted cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub fingerprint: Fingerprint,
    pub namespace: String,
    /// Normalized query text, kept for inspection only.
    pub query_text: String,
    pub value: Bytes,
    pub created_at: i64,
    pub expires_at: i64,
    pub access_count: i64,
    pub last_accessed: i64,
}

impl Entry {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            fingerprint: Fingerprint::from_stored(row.get(0)?),
            namespace: row.get(1)?,
            query_text: row.get(2)?,
            value: Bytes::from(row.get::<_, Vec<u8>>(3)?),
            created_at: row.get(4)?,
            expires_at: row.get(5)?,
            access_count: row.get(6)?,
            last_accessed: row.get(7)?,
        })
    }
}

/// Row counts over the persistent tier at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersistentStats {
    pub valid_count: u64,
    pub expired_count: u64,
    /// Mean `access_count` over valid rows only; 0 when there are none.
    pub avg_access_count: f64,
}

impl PersistentTier {
    /// Fetch a live entry, recording the access.
    ///
    /// The access counter bump and the read happen in one transaction, so
    /// concurrent readers never lose an increment.
    pub async fn get(&self, fingerprint: &Fingerprint, now: i64) -> Result<Option<Entry>, Error> {
        let fingerprint = fingerprint.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<Option<Entry>, Error> {
                let tx = conn.transaction()?;
                let touched = tx.execute(
                    "UPDATE cache_entries
                    SET access_count = access_count + 1, last_accessed = ?2
                    WHERE fingerprint = ?1 AND expires_at > ?2",
                    params![fingerprint, now],
                )?;
                if touched == 0 {
                    return Ok(None);
                }

                let entry = tx.query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM cache_entries WHERE fingerprint = ?1"),
                    params![fingerprint],
                    Entry::from_row,
                )?;
                tx.commit()?;
                Ok(Some(entry))
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace an entry.
    ///
    /// Uses UPSERT semantics: the whole row is overwritten, including the
    /// access statistics. Empty values and non-positive lifetimes are rejected
    /// without touching the store.
    pub async fn put(&self, entry: &Entry) -> Result<(), Error> {
        if entry.value.is_empty() {
            return Err(Error::InvalidInput("cache value must not be empty".into()));
        }
        if entry.expires_at <= entry.created_at {
            return Err(Error::InvalidInput(format!(
                "expires_at ({}) must be after created_at ({})",
                entry.expires_at, entry.created_at
            )));
        }

        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (
                        fingerprint, namespace, original_query_text, serialized_value,
                        created_at, expires_at, access_count, last_accessed
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(fingerprint) DO UPDATE SET
                        namespace = excluded.namespace,
                        original_query_text = excluded.original_query_text,
                        serialized_value = excluded.serialized_value,
                        created_at = excluded.created_at,
                        expires_at = excluded.expires_at,
                        access_count = excluded.access_count,
                        last_accessed = excluded.last_accessed",
                    params![
                        entry.fingerprint.as_str(),
                        &entry.namespace,
                        &entry.query_text,
                        &entry.value[..],
                        entry.created_at,
                        entry.expires_at,
                        entry.access_count,
                        entry.last_accessed,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns whether a row existed.
    pub async fn delete(&self, fingerprint: &Fingerprint) -> Result<bool, Error> {
        let fingerprint = fingerprint.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE fingerprint = ?1", params![fingerprint])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every row with `expires_at <= now`.
    ///
    /// Returns the number of deleted entries.
    pub async fn sweep_expired(&self, now: i64) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every row.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every row in a namespace.
    ///
    /// Returns the fingerprints that were removed.
    pub async fn purge_namespace(&self, namespace: &str) -> Result<Vec<Fingerprint>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<Fingerprint>, Error> {
                let tx = conn.transaction()?;
                let removed = {
                    let mut stmt = tx.prepare("SELECT fingerprint FROM cache_entries WHERE namespace = ?1")?;
                    let rows = stmt.query_map(params![namespace], |row| row.get::<_, String>(0))?;
                    rows.map(|r| r.map(Fingerprint::from_stored))
                        .collect::<Result<Vec<_>, _>>()?
                };
                tx.execute("DELETE FROM cache_entries WHERE namespace = ?1", params![namespace])?;
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(Error::from)
    }

    /// Purge least recently accessed rows until count <= max_entries.
    ///
    /// Returns the fingerprints that were removed.
    pub async fn purge_lru(&self, max_entries: usize) -> Result<Vec<Fingerprint>, Error> {
        let max = i64::try_from(max_entries).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<Vec<Fingerprint>, Error> {
                let tx = conn.transaction()?;
                let count: i64 = tx.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                if count <= max {
                    return Ok(Vec::new());
                }

                let removed = {
                    let mut stmt = tx.prepare(
                        "SELECT fingerprint FROM cache_entries
                        ORDER BY last_accessed ASC, created_at ASC
                        LIMIT ?1",
                    )?;
                    let rows = stmt.query_map(params![count - max], |row| row.get::<_, String>(0))?;
                    rows.map(|r| r.map(Fingerprint::from_stored))
                        .collect::<Result<Vec<_>, _>>()?
                };
                {
                    let mut delete = tx.prepare("DELETE FROM cache_entries WHERE fingerprint = ?1")?;
                    for fingerprint in &removed {
                        delete.execute(params![fingerprint.as_str()])?;
                    }
                }
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(Error::from)
    }

    /// Count valid and expired rows as of `now`.
    pub async fn stats(&self, now: i64) -> Result<PersistentStats, Error> {
        self.conn
            .call(move |conn| -> Result<PersistentStats, Error> {
                let stats = conn.query_row(
                    "SELECT
                        COALESCE(SUM(CASE WHEN expires_at > ?1 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN expires_at <= ?1 THEN 1 ELSE 0 END), 0),
                        AVG(CASE WHEN expires_at > ?1 THEN access_count END)
                    FROM cache_entries",
                    params![now],
                    |row| {
                        Ok(PersistentStats {
                            valid_count: row.get::<_, i64>(0)? as u64,
                            expired_count: row.get::<_, i64>(1)? as u64,
                            avg_access_count: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                        })
                    },
                )?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
