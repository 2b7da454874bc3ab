//! Core record types shared between the pipeline and store backends

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Identifier of an extension project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Wrap a raw identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Visibility scope of a shared icon
///
/// Only `global` icons are visible to every project; any other value is an
/// opaque scope name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Visibility(String);

impl Visibility {
    /// Scope name of icons visible to every project
    pub const GLOBAL: &'static str = "global";

    /// The `global` scope
    #[inline]
    #[must_use]
    pub fn global() -> Self {
        Self(Self::GLOBAL.to_string())
    }

    /// A named scope
    #[inline]
    #[must_use]
    pub fn scoped(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Whether this is the `global` scope
    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0 == Self::GLOBAL
    }

    /// Scope name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::global()
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of uploaded project asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Icon; path must live under `icons/`
    Icon,
    /// Any other uploaded file
    #[default]
    Asset,
}

/// A binary asset uploaded for one project (tier 1 of icon resolution)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAsset {
    pub project_id: ProjectId,
    pub file_path: String,
    pub file_type: AssetKind,
    pub content_base64: String,
    pub mime_type: String,
    pub file_size: u64,
    pub updated_at: DateTime<Utc>,
}

/// An icon in the shared, cross-project store (tier 2 of icon resolution)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedIconRecord {
    /// Archive path this icon satisfies (`icons/bolt.png`)
    pub path_hint: String,
    pub visibility: Visibility,
    pub content_base64: String,
    pub mime: String,
    /// Pixel sizes this icon is suitable for (`["16"]`)
    #[serde(default)]
    pub sizes: Vec<String>,
    /// SHA-256 of the decoded bytes, hex
    pub hash: String,
    pub updated_at: DateTime<Utc>,
}
