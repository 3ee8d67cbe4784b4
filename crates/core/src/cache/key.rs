//! Cache key normalization and fingerprinting.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fixed-length (64 hex chars) digest of a normalized `namespace:query` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a digest read back from the store.
    pub(crate) fn from_stored(digest: String) -> Self {
        Self(digest)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a raw query: lowercased, whitespace runs collapsed,
/// trimmed, and with single/double quotes removed.
pub fn normalize_query(raw_query: &str) -> String {
    let collapsed = raw_query.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(['"', '\''], "")
}

/// Compute the fingerprint for a query within a namespace.
///
/// The digest input is `namespace:normalized_query` with no escaping, so a
/// namespace containing `:` can alias another namespace: `("b:c", "a")` and
/// `("c", "a:b")` share a fingerprint. Keep `:` out of namespace names.
pub fn compute_fingerprint(raw_query: &str, namespace: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(normalize_query(raw_query).as_bytes());
    Fingerprint(hex::encode(hasher.finalize()))
}
