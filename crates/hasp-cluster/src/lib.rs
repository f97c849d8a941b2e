//! Hasp Cluster - mutual exclusion across processes sharing a key-value store
//!
//! This crate provides:
//! - [`Mutex`]: a named cluster-wide lock backed by any [`hasp_kv::KvStore`]
//! - TTL leases with background refresh, so crashed holders free their locks
//! - Cooperative cancellation of acquisition via a caller-supplied future
//! - Lost-lease detection for holders whose lease expired out from under them
//!
//! At most one handle in the cluster holds a given lock name at any instant;
//! the sole exclusivity mechanism is the store's per-key compare-and-swap.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hasp_cluster::Mutex;
//! use hasp_kv::MemoryStore;
//!
//! # async fn example() {
//! let store = Arc::new(MemoryStore::new());
//! let mutex = Mutex::new(store, "migration");
//!
//! mutex.lock().await;
//! // ...the critical section, exclusive across the whole cluster...
//! mutex.unlock().await;
//! # }
//! ```

mod key;

pub mod config;
pub mod error;
pub mod lease;
pub mod metrics;
pub mod mutex;

// Re-export commonly used types
pub use config::{DEFAULT_POLL_INTERVAL, DEFAULT_TTL, MutexConfig};
pub use error::{LockError, Result};
pub use lease::LeaseOwner;
pub use mutex::Mutex;
