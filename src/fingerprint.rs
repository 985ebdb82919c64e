//! Content fingerprints for observed state.
//!
//! A fingerprint is a short, deterministic digest of a resource's content.
//! Refresh compares fingerprints to detect drift, and the in-memory
//! identity service hands them out as entity tags for `if-match` checks.
//!
//! ```rust
//! use oci_identity_provider::fingerprint::Fingerprint;
//! use serde_json::json;
//!
//! let a = Fingerprint::of_json(&json!({"name": "-tf-user", "description": "x"}));
//! let b = Fingerprint::of_json(&json!({"description": "x", "name": "-tf-user"}));
//! assert_eq!(a, b);
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest raw bytes. Only the first 8 bytes of the SHA-256 are kept.
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let hash = hasher.finalize();
        Self(BASE64.encode(&hash[..8]))
    }

    /// Digest a JSON value.
    ///
    /// Object keys are serialized in sorted order, so two values with the same
    /// content always produce the same fingerprint.
    pub fn of_json(value: &Value) -> Self {
        let bytes = serde_json::to_vec(value).unwrap_or_default();
        Self::from_content(&bytes)
    }

    /// Wrap a fingerprint received from elsewhere (an etag header, saved state).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_content_same_fingerprint() {
        let a = Fingerprint::from_content(b"ocid1.user.oc1..abc:1");
        let b = Fingerprint::from_content(b"ocid1.user.oc1..abc:1");
        assert_eq!(a, b);
        // 8 bytes of digest encode to 12 base64 characters
        assert_eq!(a.as_str().len(), 12);
    }

    #[test]
    fn test_content_change_changes_fingerprint() {
        let before = Fingerprint::of_json(&json!({"description": "automated test user"}));
        let after = Fingerprint::of_json(&json!({"description": "automated test user updated"}));
        assert_ne!(before, after);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let fingerprint = Fingerprint::from_raw("abc123");
        assert_eq!(serde_json::to_value(&fingerprint).unwrap(), json!("abc123"));
    }
}
