//! Cluster mutex over a shared key-value store

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use hasp_kv::KvStore;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::config::MutexConfig;
use crate::error::{LockError, Result};
use crate::key::lock_key;
use crate::lease::LeaseOwner;
use crate::metrics;

/// Everything owned while the lock is held: the exact marker bytes sitting in
/// the store and the refresher task keeping them alive.
struct HeldLease {
    marker: Bytes,
    lease_lost: Arc<AtomicBool>,
    stop_tx: oneshot::Sender<()>,
    refresher: JoinHandle<()>,
}

impl HeldLease {
    // Signal the refresher and wait for it to wind down. An in-flight refresh
    // write completes first, so no refresh can race a release write issued
    // after this returns.
    async fn stop(self) -> Bytes {
        let _ = self.stop_tx.send(());
        let _ = self.refresher.await;
        self.marker
    }

    // Stop without waiting; used when a fresh lease replaces a stale one.
    fn stop_detached(self) {
        let _ = self.stop_tx.send(());
    }
}

/// A mutual-exclusion lock shared by every process in a cluster.
///
/// Exclusivity comes entirely from the store's per-key compare-and-swap: a
/// handle holds the lock exactly while the marker it wrote sits under the
/// lock key. Leases are written with a TTL and re-asserted by a background
/// refresher at half that TTL, so a live holder keeps the lock indefinitely
/// while a crashed one frees it within one TTL.
///
/// Handles are cheap to create and contact the store only from
/// [`lock`](Mutex::lock) and [`unlock`](Mutex::unlock). A handle may be
/// shared across tasks behind an `Arc`; like any mutex, locking it again
/// without an intervening unlock blocks the second caller.
///
/// Dropping a locked handle abandons the lease rather than releasing it: the
/// refresher stops and the store reclaims the key once the TTL elapses, just
/// as after a crash.
pub struct Mutex {
    store: Arc<dyn KvStore>,
    key: String,
    config: MutexConfig,
    held: parking_lot::Mutex<Option<HeldLease>>,
}

impl Mutex {
    /// Creates a handle for the named lock with default tuning.
    ///
    /// Panics when `name` is empty.
    pub fn new(store: Arc<dyn KvStore>, name: &str) -> Self {
        Self::with_config(store, name, MutexConfig::default())
    }

    /// Creates a handle for the named lock with explicit tuning.
    ///
    /// Panics when `name` is empty or the config is invalid.
    pub fn with_config(store: Arc<dyn KvStore>, name: &str, config: MutexConfig) -> Self {
        config.validate();
        Self {
            store,
            key: lock_key(name),
            config,
            held: parking_lot::Mutex::new(None),
        }
    }

    /// The store key this lock occupies.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this handle currently believes it holds the lock.
    pub fn is_held(&self) -> bool {
        self.held.lock().is_some()
    }

    /// Whether the held lease has been observed lost (expired, and possibly
    /// taken by another holder) while this handle still believes it holds
    /// the lock. Always false when not held.
    pub fn lease_lost(&self) -> bool {
        self.held
            .lock()
            .as_ref()
            .is_some_and(|lease| lease.lease_lost.load(Ordering::SeqCst))
    }

    /// Acquires the lock, blocking the calling task until it is obtained.
    ///
    /// Retries forever through contention and store failures. Callers that
    /// need to give up use [`lock_with_cancel`](Mutex::lock_with_cancel).
    pub async fn lock(&self) {
        match self.lock_with_cancel(std::future::pending()).await {
            Ok(()) => {}
            Err(LockError::Cancelled) => {
                unreachable!("acquisition without a cancel signal cannot be cancelled")
            }
        }
    }

    /// Acquires the lock unless `cancel` completes first.
    ///
    /// The signal is checked before every attempt: an already-completed
    /// future cancels before the first store write, and a write already in
    /// flight always runs to completion before cancellation is honored.
    /// Contention and store failures are retried at the poll interval and
    /// never surface as errors.
    pub async fn lock_with_cancel(&self, cancel: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(cancel);

        let mut wait = Duration::ZERO;
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    debug!(key = %self.key, "Lock acquisition cancelled");
                    metrics::record_acquisition("cancelled");
                    return Err(LockError::Cancelled);
                }
                _ = tokio::time::sleep(wait) => {}
            }

            if self.try_acquire().await {
                metrics::record_acquisition("acquired");
                metrics::lock_held_delta(1.0);
                return Ok(());
            }

            wait = self.config.poll_interval;
        }
    }

    /// Releases the lock.
    ///
    /// Panics when this handle does not hold it. The refresher is stopped
    /// before the release write. A release write that fails or no longer
    /// matches is logged and swallowed: local state clears regardless, and
    /// TTL expiry vacates the remote record if the delete never lands.
    pub async fn unlock(&self) {
        let lease = match self.held.lock().take() {
            Some(lease) => lease,
            None => panic!("cluster mutex is not locked"),
        };

        let marker = lease.stop().await;

        match self.store.compare_and_delete(&self.key, marker).await {
            Ok(true) => {
                debug!(key = %self.key, "Lock released");
            }
            Ok(false) => {
                warn!(key = %self.key, "Lease was no longer ours at release");
            }
            Err(err) => {
                metrics::record_store_error("release");
                warn!(
                    key = %self.key,
                    error = %err,
                    "Store error during release; lease left to expire"
                );
            }
        }

        metrics::lock_held_delta(-1.0);
    }

    /// One acquisition attempt. True means the lock is ours and the refresher
    /// is running.
    async fn try_acquire(&self) -> bool {
        let owner = LeaseOwner::claim();
        let marker = owner.encode();

        match self
            .store
            .compare_and_set(&self.key, None, marker.clone(), Some(self.config.ttl))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                trace!(key = %self.key, "Lock held elsewhere");
                metrics::record_contention(&self.key);
                return false;
            }
            Err(err) => {
                // A broken store is retried exactly like contention.
                warn!(key = %self.key, error = %err, "Store error during lock acquisition");
                metrics::record_store_error("acquire");
                return false;
            }
        }

        debug!(key = %self.key, token = %owner.token, "Lock acquired");

        let lease_lost = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = oneshot::channel();
        let refresher = self.spawn_refresher(marker.clone(), lease_lost.clone(), stop_rx);

        let stale = self.held.lock().replace(HeldLease {
            marker,
            lease_lost,
            stop_tx,
            refresher,
        });
        if let Some(stale) = stale {
            // Only reachable when the previous lease expired while believed
            // held: the store just accepted a CAS against an absent key.
            warn!(key = %self.key, "Replacing a lease that expired while believed held");
            stale.stop_detached();
            metrics::lock_held_delta(-1.0);
        }

        true
    }

    /// Starts the background task that re-asserts the lease at half the TTL.
    /// It stops only when the stop channel fires or its sender drops; failed
    /// refreshes are reported and retried on the next tick.
    fn spawn_refresher(
        &self,
        marker: Bytes,
        lease_lost: Arc<AtomicBool>,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        let store = self.store.clone();
        let key = self.key.clone();
        let ttl = self.config.ttl;
        let refresh_interval = self.config.refresh_interval();
        // Anchor ticks to the lease write; the task's first poll may come later.
        let first_refresh = tokio::time::Instant::now() + refresh_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first_refresh, refresh_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        refresh_lease(store.as_ref(), &key, &marker, ttl, &lease_lost).await;
                    }
                }
            }

            trace!(key = %key, "Lease refresher stopped");
        })
    }
}

async fn refresh_lease(
    store: &dyn KvStore,
    key: &str,
    marker: &Bytes,
    ttl: Duration,
    lease_lost: &AtomicBool,
) {
    match store
        .compare_and_set(key, Some(marker.clone()), marker.clone(), Some(ttl))
        .await
    {
        Ok(true) => {
            trace!(key = %key, "Lease refreshed");
        }
        Ok(false) => {
            // The record expired or belongs to someone else now. Keep ticking:
            // custody is settled by the store's CAS, and only unlock stops
            // this task.
            metrics::record_refresh_failure(key);
            if !lease_lost.swap(true, Ordering::SeqCst) {
                warn!(key = %key, "Lease no longer ours; held state is stale until unlock or relock");
            } else {
                debug!(key = %key, "Lease still lost");
            }
        }
        Err(err) => {
            // Unreachable store is not evidence the lease is lost; the next
            // acquirer's CAS is what ends our custody.
            metrics::record_store_error("refresh");
            warn!(key = %key, error = %err, "Store error during lease refresh");
        }
    }
}
