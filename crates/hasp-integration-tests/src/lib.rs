//! Common test utilities for the hasp scenario suites
//!
//! This module provides:
//! - Unique lock names so concurrently running tests never contend
//! - A fast [`MutexConfig`] for real-clock tests

use std::time::Duration;

use hasp_cluster::MutexConfig;

/// Generate a unique lock name to avoid conflicts between tests
pub fn unique_lock_name(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}_{}", prefix, timestamp)
}

/// Tuning for real-clock tests: polls fast enough to finish quickly, with a
/// TTL large enough that a slow CI machine cannot expire a live holder.
pub fn fast_config() -> MutexConfig {
    MutexConfig {
        ttl: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_lock_names_differ() {
        assert_ne!(unique_lock_name("a"), unique_lock_name("a"));
    }

    #[test]
    fn test_fast_config_is_valid() {
        let config = fast_config();
        assert!(config.poll_interval < config.ttl);
    }
}
