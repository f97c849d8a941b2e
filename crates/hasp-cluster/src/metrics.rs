// Metrics for lock activity
// Counters and gauges published through the metrics facade; installing an
// exporter is the embedding application's concern

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Initialize all metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    describe_counter!(
        "hasp_lock_acquisitions_total",
        "Total number of lock acquisitions, labelled by outcome"
    );
    describe_counter!(
        "hasp_lock_contention_total",
        "Total number of acquisition attempts that lost the CAS race"
    );
    describe_counter!(
        "hasp_lock_store_errors_total",
        "Total number of store failures during lock operations"
    );
    describe_counter!(
        "hasp_lease_refresh_failures_total",
        "Total number of lease refresh writes that did not apply"
    );
    describe_gauge!("hasp_locks_held", "Number of locks currently held by this process");

    tracing::info!("Metrics initialized");
}

/// Record an acquisition outcome ("acquired" or "cancelled")
pub fn record_acquisition(outcome: &str) {
    counter!("hasp_lock_acquisitions_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record an acquisition attempt that lost the CAS race
pub fn record_contention(key: &str) {
    counter!("hasp_lock_contention_total", "key" => key.to_string()).increment(1);
}

/// Record a store failure during a lock operation
pub fn record_store_error(operation: &str) {
    counter!("hasp_lock_store_errors_total", "operation" => operation.to_string()).increment(1);
}

/// Record a lease refresh that did not apply
pub fn record_refresh_failure(key: &str) {
    counter!("hasp_lease_refresh_failures_total", "key" => key.to_string()).increment(1);
}

/// Track a lock becoming held or released
pub fn lock_held_delta(delta: f64) {
    gauge!("hasp_locks_held").increment(delta);
}
