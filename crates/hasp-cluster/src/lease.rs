//! Lease owner marker

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The value written under a lock key while the lock is held.
///
/// The token makes every acquisition unique: refresh and release writes use
/// the encoded marker as their CAS precondition, so a handle whose lease
/// expired can never disturb the record of whoever holds the lock now.
/// Hostname, pid, and acquisition time identify the holder when inspecting
/// store contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseOwner {
    pub token: Uuid,
    pub hostname: String,
    pub pid: u32,
    pub acquired_at_ms: i64,
}

impl LeaseOwner {
    /// Build a fresh marker for one acquisition.
    pub(crate) fn claim() -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            token: Uuid::new_v4(),
            hostname,
            pid: std::process::id(),
            acquired_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Encoded form written to the store. The holder keeps these exact bytes
    /// for the lifetime of the lease; refresh and release compare against
    /// them byte-for-byte.
    pub(crate) fn encode(&self) -> Bytes {
        let encoded = serde_json::to_vec(self)
            .unwrap_or_else(|_| self.token.to_string().into_bytes());
        Bytes::from(encoded)
    }

    /// Decode a marker read back from the store, e.g. when diagnosing a held
    /// lock. `None` when the bytes are not a marker this crate wrote.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_are_unique() {
        let a = LeaseOwner::claim();
        let b = LeaseOwner::claim();
        assert_ne!(a.token, b.token);
        assert_ne!(a.encode(), b.encode());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let owner = LeaseOwner::claim();
        let decoded = LeaseOwner::decode(&owner.encode()).unwrap();
        assert_eq!(decoded, owner);
    }

    #[test]
    fn test_marker_is_json_with_token_string() {
        let owner = LeaseOwner::claim();
        let value: serde_json::Value = serde_json::from_slice(&owner.encode()).unwrap();
        assert_eq!(value["token"], serde_json::json!(owner.token.to_string()));
        assert_eq!(value["pid"], serde_json::json!(owner.pid));
    }

    #[test]
    fn test_decode_rejects_foreign_bytes() {
        assert!(LeaseOwner::decode(b"not json").is_none());
        assert!(LeaseOwner::decode(b"{\"some\":\"object\"}").is_none());
    }

    #[test]
    fn test_claim_fills_process_identity() {
        let owner = LeaseOwner::claim();
        assert_eq!(owner.pid, std::process::id());
        assert!(!owner.hostname.is_empty());
        assert!(owner.acquired_at_ms > 0);
    }
}
