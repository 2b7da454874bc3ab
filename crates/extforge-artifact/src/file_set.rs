//! Project file sets
//!
//! A [`FileSet`] maps bundle-relative paths to text or binary content for one
//! extension project. Iteration is always path-sorted so everything derived
//! from a file set (reports, archives) is deterministic.

use crate::path::{ArchivePath, PathError};
use std::collections::BTreeMap;

/// Content of a single project file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// UTF-8 source text (scripts, styles, HTML, JSON)
    Text(String),
    /// Raw bytes (images, fonts)
    Binary(Vec<u8>),
}

impl FileContent {
    /// Classify raw bytes: valid UTF-8 becomes [`FileContent::Text`]
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(err) => Self::Binary(err.into_bytes()),
        }
    }

    /// Text view, `None` for binary content
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Byte view of either variant
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Convert to bytes (consumes self)
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Whether this is text content
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Content length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// Path → content mapping for one extension project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<ArchivePath, FileContent>,
}

impl FileSet {
    /// Create an empty file set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(path, content)` pairs
    ///
    /// # Errors
    /// Returns the first [`PathError`] encountered.
    pub fn from_pairs<I, P, C>(pairs: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<FileContent>,
    {
        let mut set = Self::new();
        for (path, content) in pairs {
            set.insert(ArchivePath::new(path)?, content);
        }
        Ok(set)
    }

    /// Insert or replace a file, returning the previous content
    pub fn insert(
        &mut self,
        path: ArchivePath,
        content: impl Into<FileContent>,
    ) -> Option<FileContent> {
        self.files.insert(path, content.into())
    }

    /// Insert text at a raw path
    ///
    /// # Errors
    /// Returns [`PathError`] if the path is not a valid archive path.
    pub fn insert_text(
        &mut self,
        path: &str,
        text: impl Into<String>,
    ) -> Result<Option<FileContent>, PathError> {
        let path = ArchivePath::new(path)?;
        Ok(self.insert(path, FileContent::Text(text.into())))
    }

    /// Get file content
    #[inline]
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FileContent> {
        self.files.get(path)
    }

    /// Get text content (`None` if absent or binary)
    #[inline]
    #[must_use]
    pub fn get_text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(FileContent::as_text)
    }

    /// Check if a path is present
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Remove a file
    pub fn remove(&mut self, path: &str) -> Option<FileContent> {
        self.files.remove(path)
    }

    /// Number of files
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate files in path order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&ArchivePath, &FileContent)> {
        self.files.iter()
    }

    /// Iterate paths in order
    #[inline]
    pub fn paths(&self) -> impl Iterator<Item = &ArchivePath> {
        self.files.keys()
    }

    /// Text files that live outside `icons/`
    pub fn source_texts(&self) -> impl Iterator<Item = (&ArchivePath, &str)> {
        self.files
            .iter()
            .filter(|(path, _)| !path.is_icon())
            .filter_map(|(path, content)| content.as_text().map(|text| (path, text)))
    }
}

impl FromIterator<(ArchivePath, FileContent)> for FileSet {
    fn from_iter<T: IntoIterator<Item = (ArchivePath, FileContent)>>(iter: T) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FileSet {
    type Item = (ArchivePath, FileContent);
    type IntoIter = std::collections::btree_map::IntoIter<ArchivePath, FileContent>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_classifies_utf8() {
        assert!(FileContent::from_bytes(b"console.log(1)".to_vec()).is_text());
        assert!(!FileContent::from_bytes(vec![0x89, 0x50, 0xff, 0x00]).is_text());
    }

    #[test]
    fn from_pairs_rejects_bad_paths() {
        let result = FileSet::from_pairs([("../evil.js", "x")]);
        assert!(matches!(result, Err(PathError::Traversal(_))));
    }

    #[test]
    fn lookup_by_str() {
        let set = FileSet::from_pairs([("manifest.json", "{}"), ("content.js", "run()")]).unwrap();
        assert!(set.contains("content.js"));
        assert_eq!(set.get_text("manifest.json"), Some("{}"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn iteration_is_path_sorted() {
        let set = FileSet::from_pairs([("z.js", "1"), ("a.js", "2"), ("m/b.js", "3")]).unwrap();
        let paths: Vec<_> = set.paths().map(ArchivePath::as_str).collect();
        assert_eq!(paths, vec!["a.js", "m/b.js", "z.js"]);
    }

    #[test]
    fn source_texts_skip_icons_and_binaries() {
        let mut set = FileSet::from_pairs([("popup.js", "x"), ("icons/readme.txt", "y")]).unwrap();
        set.insert(ArchivePath::new("logo.png").unwrap(), vec![1u8, 2, 3]);

        let sources: Vec<_> = set.source_texts().map(|(p, _)| p.as_str()).collect();
        assert_eq!(sources, vec!["popup.js"]);
    }

    #[test]
    fn insert_replaces_previous() {
        let mut set = FileSet::new();
        assert!(set.insert_text("a.js", "one").unwrap().is_none());
        let previous = set.insert_text("a.js", "two").unwrap();
        assert_eq!(previous, Some(FileContent::Text("one".into())));
        assert_eq!(set.get_text("a.js"), Some("two"));
    }
}
