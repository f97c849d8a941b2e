//! Error types for lock acquisition

/// Error type for cancellable lock acquisition.
///
/// Deliberately narrow: contention and store failures are retried inside the
/// acquisition loop and never surface here. The only way a lock call fails is
/// the caller's own cancellation signal firing first.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock acquisition cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, LockError>;
