//! Error types for key-value store operations

/// Error type for store operations.
///
/// A failed compare-and-swap is not an error: `set` reports it as `Ok(false)`.
/// Variants here mean the store itself could not serve the request, which callers
/// must be able to tell apart from losing a CAS race.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store operation timed out")]
    Timeout,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
