//! Lock key derivation

/// Namespace prefix for lock keys in the store.
pub(crate) const MUTEX_KEY_PREFIX: &str = "mutex_";

/// Derives the store key for a logical lock name.
///
/// Panics when `name` is empty.
pub(crate) fn lock_key(name: &str) -> String {
    assert!(!name.is_empty(), "lock name must not be empty");
    format!("{MUTEX_KEY_PREFIX}{name}")
}
