//! Store trait and write options

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Options controlling a [`KvStore::set`] write.
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// When true the write is a compare-and-swap: it applies only if the current
    /// value equals [`expected`](Self::expected).
    pub atomic: bool,
    /// Prior value the key must hold for an atomic write to apply. `None` means
    /// the key must be absent. Ignored for non-atomic writes.
    pub expected: Option<Bytes>,
    /// Expiry for the written value, maintained by the store. `None` means the
    /// value never expires.
    pub expire_after: Option<Duration>,
}

/// Shared key-value store with atomic compare-and-swap writes and per-key expiry.
///
/// This is the boundary the cluster mutex builds on. Implementations must
/// serialize all writes to a given key: two conflicting compare-and-swaps for the
/// same key must never both apply. Expiry is the implementation's obligation; an
/// expired value behaves exactly like an absent one.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` when the key is absent
    /// (including expired).
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Writes `value` under `key` according to `opts`; a `value` of `None`
    /// deletes the key.
    ///
    /// Returns whether the write was applied. `Ok(false)` means an atomic
    /// write's precondition did not hold; store failures are reported as `Err`
    /// so callers can tell a lost race apart from a broken store. Non-atomic
    /// writes always apply.
    async fn set(&self, key: &str, value: Option<Bytes>, opts: SetOptions) -> Result<bool>;

    /// Atomically writes `value` iff the current value equals `expected`
    /// (`None` = key absent), with an optional expiry.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<Bytes>,
        value: Bytes,
        expire_after: Option<Duration>,
    ) -> Result<bool> {
        self.set(
            key,
            Some(value),
            SetOptions {
                atomic: true,
                expected,
                expire_after,
            },
        )
        .await
    }

    /// Atomically deletes `key` iff the current value equals `expected`.
    async fn compare_and_delete(&self, key: &str, expected: Bytes) -> Result<bool> {
        self.set(
            key,
            None,
            SetOptions {
                atomic: true,
                expected: Some(expected),
                expire_after: None,
            },
        )
        .await
    }

    /// Unconditionally writes `value` with an expiry.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: Bytes,
        expire_after: Duration,
    ) -> Result<bool> {
        self.set(
            key,
            Some(value),
            SetOptions {
                atomic: false,
                expected: None,
                expire_after: Some(expire_after),
            },
        )
        .await
    }

    /// Unconditionally deletes `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<bool> {
        self.set(key, None, SetOptions::default()).await
    }
}
