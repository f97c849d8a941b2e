//! Hasp KV - key-value store abstraction for cluster coordination
//!
//! This crate provides:
//! - The [`KvStore`] trait: async get/set with atomic compare-and-swap and
//!   per-key expiry, the boundary the cluster mutex builds on
//! - [`MemoryStore`]: in-memory reference implementation with TTL expiry
//! - [`testing::FlakyStore`]: failure-injection wrapper for tests

pub mod error;
pub mod memory;
pub mod store;
pub mod testing;

// Re-export commonly used types
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use store::{KvStore, SetOptions};
