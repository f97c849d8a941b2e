// In-memory store implementation
// Provides per-key atomic compare-and-swap with TTL expiry

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use metrics::gauge;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::error::Result;
use crate::store::{KvStore, SetOptions};

/// A stored value plus its expiry deadline
struct StoredValue {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory [`KvStore`] backed by a `DashMap`.
///
/// The reference implementation of the store contract: per-key atomicity comes
/// from holding the map's entry guard across the compare-and-write, and expired
/// values behave exactly like absent ones. Expiry is lazy, reclaiming entries
/// when they are read or contended, unless a background sweeper is started with
/// [`MemoryStore::with_sweeper`].
///
/// Uses the Tokio clock, so tests running under a paused runtime control expiry
/// by advancing time.
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredValue>>,
    sweeper: Option<JoinHandle<()>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with lazy expiry only.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            sweeper: None,
        }
    }

    /// Create an empty store and start a background task that removes expired
    /// entries every `sweep_interval`. Must be called from within a Tokio
    /// runtime. The task stops when the store is dropped.
    pub fn with_sweeper(sweep_interval: Duration) -> Self {
        let entries: Arc<DashMap<String, StoredValue>> = Arc::new(DashMap::new());

        let sweep_entries = entries.clone();
        let sweeper = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let expired_keys: Vec<String> = sweep_entries
                    .iter()
                    .filter(|entry| entry.value().is_expired())
                    .map(|entry| entry.key().clone())
                    .collect();

                for key in &expired_keys {
                    // The entry may have been rewritten since the scan.
                    sweep_entries.remove_if(key, |_, value| value.is_expired());
                }

                if !expired_keys.is_empty() {
                    debug!(count = expired_keys.len(), "Removed expired entries");
                }

                gauge!("hasp_kv_live_keys").set(sweep_entries.len() as f64);
            }
        });

        Self {
            entries,
            sweeper: Some(sweeper),
        }
    }

    /// Number of entries currently in the map, including expired entries not
    /// yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, expired or not.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
            drop(entry);
            self.entries.remove_if(key, |_, value| value.is_expired());
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Option<Bytes>, opts: SetOptions) -> Result<bool> {
        let expires_at = opts.expire_after.map(|after| Instant::now() + after);

        if !opts.atomic {
            match value {
                Some(value) => {
                    self.entries
                        .insert(key.to_string(), StoredValue { value, expires_at });
                }
                None => {
                    self.entries.remove(key);
                }
            }
            return Ok(true);
        }

        // The entry guard holds the shard lock, so the compare and the write
        // below are one atomic step for this key.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    // Expired entries compare as absent.
                    if opts.expected.is_some() {
                        occupied.remove();
                        return Ok(false);
                    }
                    match value {
                        Some(value) => {
                            occupied.insert(StoredValue { value, expires_at });
                        }
                        None => {
                            occupied.remove();
                        }
                    }
                    return Ok(true);
                }

                let matches = opts
                    .expected
                    .as_ref()
                    .is_some_and(|expected| *expected == occupied.get().value);
                if !matches {
                    return Ok(false);
                }
                match value {
                    Some(value) => {
                        occupied.insert(StoredValue { value, expires_at });
                    }
                    None => {
                        occupied.remove();
                    }
                }
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                if opts.expected.is_some() {
                    return Ok(false);
                }
                if let Some(value) = value {
                    vacant.insert(StoredValue { value, expires_at });
                }
                Ok(true)
            }
        }
    }
}
