//! Newtype identifiers so a cluster id can never be passed where a message
//! id is expected — a class of bug idiomatic Rust turns into a compile
//! error instead of a silent mismatch at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Content-derived, stable identifier: sha256 of the caller-supplied
    /// content bytes, truncated to 16 hex chars. Two messages with
    /// byte-identical content collide on purpose (dedup is desirable for
    /// reposts/forwards); this is not used as a security primitive.
    pub fn derive(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let digest = hasher.finalize();
        let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
        Self(hex[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// `-1` is reserved for "noise" under density-based clustering; all other
/// values are non-negative cluster indices assigned in descending
/// cluster-size order (id 0 = largest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub i32);

impl ClusterId {
    pub const NOISE: ClusterId = ClusterId(-1);

    pub fn is_noise(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let a = MessageId::derive(b"hello world");
        let b = MessageId::derive(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn derive_differs_on_different_content() {
        let a = MessageId::derive(b"hello world");
        let b = MessageId::derive(b"goodbye world");
        assert_ne!(a, b);
    }

    #[test]
    fn noise_cluster_id_is_negative() {
        assert!(ClusterId::NOISE.is_noise());
        assert!(!ClusterId(0).is_noise());
    }
}
