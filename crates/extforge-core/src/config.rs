//! Pipeline configuration

use crate::error::ConfigError;
use crate::types::Visibility;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What the validator does with an entry point whose file is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPointPolicy {
    /// Report a warning; export refuses to package the dangling reference
    #[default]
    Warn,
    /// Synthesize a default file at the declared path
    Stub,
}

/// Export pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deadline for one export, in milliseconds
    pub export_timeout_ms: u64,
    /// Prepended to every archive file name
    pub archive_prefix: String,
    /// Handling of missing background, popup and side panel files
    pub entry_point_policy: EntryPointPolicy,
    /// Add non-icon uploaded assets to the archive
    pub bundle_project_assets: bool,
    /// Scope searched in the shared icon store
    pub shared_icon_visibility: Visibility,
    /// Maximum entries in the shared icon cache
    pub cache_capacity: u64,
    /// Shared icon cache time-to-live, in seconds
    pub cache_ttl_secs: u64,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text; absent keys keep their defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on invalid TOML or unknown enum values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Export deadline
    #[inline]
    #[must_use]
    pub fn export_timeout(&self) -> Duration {
        Duration::from_millis(self.export_timeout_ms)
    }

    /// Shared icon cache time-to-live
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// With export deadline
    #[inline]
    #[must_use]
    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With archive name prefix
    #[inline]
    #[must_use]
    pub fn with_archive_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.archive_prefix = prefix.into();
        self
    }

    /// With entry point policy
    #[inline]
    #[must_use]
    pub fn with_entry_point_policy(mut self, policy: EntryPointPolicy) -> Self {
        self.entry_point_policy = policy;
        self
    }

    /// With or without bundling of uploaded assets
    #[inline]
    #[must_use]
    pub fn with_bundle_project_assets(mut self, bundle: bool) -> Self {
        self.bundle_project_assets = bundle;
        self
    }

    /// With shared icon scope
    #[inline]
    #[must_use]
    pub fn with_shared_icon_visibility(mut self, visibility: Visibility) -> Self {
        self.shared_icon_visibility = visibility;
        self
    }

    /// With shared icon cache sizing
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, capacity: u64, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl_secs = ttl.as_secs();
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            export_timeout_ms: 30_000,
            archive_prefix: String::new(),
            entry_point_policy: EntryPointPolicy::Warn,
            bundle_project_assets: true,
            shared_icon_visibility: Visibility::global(),
            cache_capacity: 1_024,
            cache_ttl_secs: 600,
        }
    }
}
