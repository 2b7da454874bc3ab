//! Resolved artifacts
//!
//! A [`ResolvedArtifact`] is the complete, in-memory content of an export
//! archive before it is encoded. It is built once per export and either
//! handed to the encoder whole or discarded.

use crate::hash::ContentHash;
use crate::path::ArchivePath;
use indexmap::IndexMap;

/// How an entry was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Project source text
    Text,
    /// Decoded binary (icons, uploaded assets)
    Binary,
}

/// One file inside a resolved artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    kind: EntryKind,
    bytes: Vec<u8>,
    hash: ContentHash,
}

impl ArchiveEntry {
    /// Create an entry, hashing its bytes
    #[must_use]
    pub fn new(kind: EntryKind, bytes: Vec<u8>) -> Self {
        let hash = ContentHash::compute(&bytes);
        Self { kind, bytes, hash }
    }

    /// Text entry
    #[inline]
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(EntryKind::Text, text.into().into_bytes())
    }

    /// Binary entry
    #[inline]
    #[must_use]
    pub fn binary(bytes: Vec<u8>) -> Self {
        Self::new(EntryKind::Binary, bytes)
    }

    /// Entry kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Entry bytes
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content hash of the bytes
    #[inline]
    #[must_use]
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }
}

/// Ordered `(path, entry)` list with replace-on-write semantics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedArtifact {
    entries: IndexMap<ArchivePath, ArchiveEntry>,
}

impl ResolvedArtifact {
    /// Create an empty artifact
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; a later write to the same path replaces the earlier one
    /// and keeps its original position.
    pub fn put(&mut self, path: ArchivePath, entry: ArchiveEntry) -> Option<ArchiveEntry> {
        self.entries.insert(path, entry)
    }

    /// Get an entry
    #[inline]
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.get(path)
    }

    /// Check if a path is present
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&ArchivePath, &ArchiveEntry)> {
        self.entries.iter()
    }

    /// Paths under `icons/`
    pub fn icon_paths(&self) -> impl Iterator<Item = &ArchivePath> {
        self.entries.keys().filter(|path| path.is_icon())
    }

    /// Reorder entries by path
    pub fn sort_by_path(&mut self) {
        self.entries.sort_keys();
    }

    /// Digest over every `(path, entry hash)` pair in order
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        ContentHash::combine(
            self.entries
                .iter()
                .map(|(path, entry)| (path.as_str(), entry.hash())),
        )
    }

    /// Total payload size in bytes
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.entries.values().map(|entry| entry.bytes.len()).sum()
    }
}
