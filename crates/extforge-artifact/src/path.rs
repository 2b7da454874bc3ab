//! Archive paths
//!
//! Provides [`ArchivePath`], a validated relative path for an entry inside an
//! extension bundle.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Directory that holds icon binaries inside a bundle
pub const ICON_DIR: &str = "icons";

/// Relative, `/`-separated path of a file inside an extension bundle
///
/// Guarantees:
/// - non-empty, no leading `/`, no `\`
/// - no empty, `.` or `..` segments (a single leading `./` is stripped)
///
/// # Examples
/// - `manifest.json`
/// - `icons/icon16.png`
/// - `scripts/content.js`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Validate and normalize a path
    ///
    /// # Errors
    /// Returns [`PathError`] if the path is empty, absolute, uses `\`, or
    /// contains empty / `.` / `..` segments.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PathError> {
        let raw = raw.as_ref();
        let trimmed = raw.strip_prefix("./").unwrap_or(raw);

        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        if trimmed.starts_with('/') {
            return Err(PathError::Absolute(raw.to_string()));
        }
        if trimmed.contains('\\') || trimmed.contains('\0') {
            return Err(PathError::InvalidCharacter(raw.to_string()));
        }
        for segment in trimmed.split('/') {
            match segment {
                "" => return Err(PathError::EmptySegment(raw.to_string())),
                "." | ".." => return Err(PathError::Traversal(raw.to_string())),
                _ => {}
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Path as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterator over `/`-separated segments
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Final segment
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Lower-cased extension of the final segment, if any
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        name.rfind('.')
            .filter(|&idx| idx > 0)
            .map(|idx| name[idx + 1..].to_ascii_lowercase())
    }

    /// Whether this path lives under the bundle's `icons/` directory
    #[inline]
    #[must_use]
    pub fn is_icon(&self) -> bool {
        is_icon_path(&self.0)
    }

    /// Consume into the inner string
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Whether a raw path string lives under `icons/`
#[inline]
#[must_use]
pub fn is_icon_path(path: &str) -> bool {
    path.strip_prefix(ICON_DIR)
        .is_some_and(|rest| rest.starts_with('/'))
}

impl Display for ArchivePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArchivePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArchivePath> for String {
    fn from(path: ArchivePath) -> Self {
        path.0
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ArchivePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for ArchivePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ArchivePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Errors related to archive paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty path
    #[error("path is empty")]
    Empty,

    /// Absolute path
    #[error("path '{0}' must be relative")]
    Absolute(String),

    /// Backslash or NUL in path
    #[error("path '{0}' contains an invalid character")]
    InvalidCharacter(String),

    /// `a//b` style path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// `.` or `..` segment
    #[error("path '{0}' escapes the bundle root")]
    Traversal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_relative_paths() {
        let path = ArchivePath::new("scripts/content.js").unwrap();
        assert_eq!(path.as_str(), "scripts/content.js");
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["scripts", "content.js"]);
        assert_eq!(path.file_name(), "content.js");
        assert_eq!(path.extension().as_deref(), Some("js"));
    }

    #[test]
    fn strips_single_leading_dot_slash() {
        let path = ArchivePath::new("./popup.html").unwrap();
        assert_eq!(path.as_str(), "popup.html");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(ArchivePath::new(""), Err(PathError::Empty));
        assert_eq!(ArchivePath::new("./"), Err(PathError::Empty));
    }

    #[test]
    fn rejects_absolute() {
        assert!(matches!(
            ArchivePath::new("/etc/passwd"),
            Err(PathError::Absolute(_))
        ));
    }

    #[test]
    fn rejects_traversal() {
        assert!(matches!(
            ArchivePath::new("../outside.js"),
            Err(PathError::Traversal(_))
        ));
        assert!(matches!(
            ArchivePath::new("a/./b.js"),
            Err(PathError::Traversal(_))
        ));
    }

    #[test]
    fn rejects_empty_segment_and_backslash() {
        assert!(matches!(
            ArchivePath::new("a//b.js"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            ArchivePath::new("a\\b.js"),
            Err(PathError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn icon_detection() {
        assert!(ArchivePath::new("icons/icon16.png").unwrap().is_icon());
        assert!(!ArchivePath::new("icons.js").unwrap().is_icon());
        assert!(!ArchivePath::new("iconset/a.png").unwrap().is_icon());
        assert!(!ArchivePath::new("assets/icons/a.png").unwrap().is_icon());
    }

    #[test]
    fn extension_ignores_dotfiles() {
        assert_eq!(ArchivePath::new(".env").unwrap().extension(), None);
        assert_eq!(
            ArchivePath::new("icons/Logo.PNG").unwrap().extension().as_deref(),
            Some("png")
        );
    }

    #[test]
    fn serde_validates() {
        let ok: ArchivePath = serde_json::from_str("\"a/b.css\"").unwrap();
        assert_eq!(ok.as_str(), "a/b.css");
        assert!(serde_json::from_str::<ArchivePath>("\"../x\"").is_err());
    }

    proptest::proptest! {
        #[test]
        fn accepted_paths_are_stable(segments in proptest::collection::vec("[A-Za-z0-9_.-]{1,8}", 1..4)) {
            let raw = segments.join("/");
            if let Ok(path) = ArchivePath::new(&raw) {
                proptest::prop_assert_eq!(ArchivePath::new(path.as_str()), Ok(path.clone()));
                proptest::prop_assert!(path.segments().all(|s| s != ".." && s != "." && !s.is_empty()));
            }
        }
    }
}
