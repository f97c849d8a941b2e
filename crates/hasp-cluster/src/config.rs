//! Mutex tuning

use std::time::Duration;

/// Default lease TTL: long enough to ride out normal pauses of a healthy
/// holder, short enough to bound lock unavailability after a holder crash.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15);

/// Default wait between acquisition attempts while the lock is contended.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Tuning for a [`Mutex`](crate::Mutex).
///
/// The refresh cadence is derived, not configurable: held leases are
/// re-asserted at half the TTL so a live holder never expires between
/// refreshes.
#[derive(Debug, Clone)]
pub struct MutexConfig {
    /// Lease TTL written with every acquisition and refresh.
    pub ttl: Duration,
    /// Fixed wait between acquisition attempts while the lock is contended or
    /// the store is erroring.
    pub poll_interval: Duration,
}

impl Default for MutexConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl MutexConfig {
    /// Interval between lease refreshes for a held lock.
    pub fn refresh_interval(&self) -> Duration {
        self.ttl / 2
    }

    // Panics on durations that cannot keep a lease alive, like an empty
    // lock name does.
    pub(crate) fn validate(&self) {
        assert!(!self.ttl.is_zero(), "lease TTL must be non-zero");
        assert!(!self.poll_interval.is_zero(), "poll interval must be non-zero");
        assert!(
            self.poll_interval < self.ttl,
            "poll interval must be shorter than the lease TTL"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MutexConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(15));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        config.validate();
    }

    #[test]
    fn test_refresh_interval_is_half_ttl() {
        let config = MutexConfig {
            ttl: Duration::from_secs(30),
            ..Default::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(15));
    }

    #[test]
    #[should_panic(expected = "lease TTL must be non-zero")]
    fn test_zero_ttl_panics() {
        MutexConfig {
            ttl: Duration::ZERO,
            ..Default::default()
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "poll interval must be shorter")]
    fn test_poll_longer_than_ttl_panics() {
        MutexConfig {
            ttl: Duration::from_secs(1),
            poll_interval: Duration::from_secs(2),
        }
        .validate();
    }
}
