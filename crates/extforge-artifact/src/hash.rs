//! Content hashing for archive entries
//!
//! Provides [`ContentHash`], a 32-byte Blake3 digest used to fingerprint
//! individual archive entries and whole resolved artifacts.

use std::fmt::{self, Display, Formatter};

/// A 32-byte content hash (Blake3)
///
/// Identifies the exact bytes written for an archive entry. Two exports of
/// the same project state produce the same hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Compute Blake3 hash of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::new(*blake3::hash(data).as_bytes())
    }

    /// Hash a sequence of `(path, content hash)` pairs
    ///
    /// Each path is length-prefixed so `("ab", h)` and `("a", ..)` followed
    /// by `("b", ..)` can never collide.
    #[must_use]
    pub fn combine<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a ContentHash)>,
    {
        let mut hasher = blake3::Hasher::new();
        for (path, hash) in entries {
            hasher.update(&(path.len() as u64).to_le_bytes());
            hasher.update(path.as_bytes());
            hasher.update(hash.as_bytes());
        }
        Self::new(*hasher.finalize().as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_deterministic() {
        assert_eq!(
            ContentHash::compute(b"manifest"),
            ContentHash::compute(b"manifest")
        );
        assert_ne!(
            ContentHash::compute(b"icon16"),
            ContentHash::compute(b"icon48")
        );
    }

    #[test]
    fn short_prefixes_full_hex() {
        let hash = ContentHash::compute(b"content.js");
        assert_eq!(hash.to_string().len(), 64);
        assert!(hash.to_string().starts_with(&hash.short()));
    }

    #[test]
    fn combine_depends_on_path_boundaries() {
        let h = ContentHash::compute(b"x");
        let joined = ContentHash::combine([("ab", &h)]);
        let split = ContentHash::combine([("a", &h), ("b", &h)]);
        assert_ne!(joined, split);
    }

    #[test]
    fn combine_depends_on_order() {
        let a = ContentHash::compute(b"a");
        let b = ContentHash::compute(b"b");
        assert_ne!(
            ContentHash::combine([("a.js", &a), ("b.js", &b)]),
            ContentHash::combine([("b.js", &b), ("a.js", &a)])
        );
    }

    #[test]
    fn serde_uses_hex_string() {
        let hash = ContentHash::compute(b"test");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
    }
}
