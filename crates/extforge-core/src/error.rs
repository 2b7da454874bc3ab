//! Error types for the packaging pipeline
//!
//! Each stage owns its error enum; [`ExportError`] is the umbrella the export
//! pipeline returns and the one that knows how to present itself to callers
//! (status code plus JSON body).

use extforge_artifact::PathError;
use extforge_manifest::ManifestError;
use serde::Serialize;
use std::path::PathBuf;

/// Errors from structural validation
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// No `manifest.json` in the file set
    #[error("manifest.json is missing")]
    ManifestMissing,

    /// Manifest text could not be parsed
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Repaired file could not be written at its path
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Failure reported by a store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the query
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored record violates an invariant
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Record rejected on write
    #[error("rejected {key}: {reason}")]
    Rejected { key: String, reason: String },

    /// Filesystem-backed store failed
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Where a decoded payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadOrigin {
    /// Tier 1: the project's own uploaded assets
    ProjectAsset,
    /// Tier 2: the shared icon store
    SharedIcon,
}

/// Errors from icon resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A matching record exists but its payload does not decode
    #[error("failed to decode {origin:?} payload for {path}: {reason}")]
    IconDecode {
        path: String,
        origin: PayloadOrigin,
        reason: String,
    },

    /// Required icons found in neither tier
    #[error("Missing required icons: {}", paths.join(", "))]
    MissingIcons { paths: Vec<String> },

    /// Reference scan task did not complete
    #[error("icon reference scan failed: {0}")]
    Scan(String),

    /// Lookup failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from archive assembly
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    /// ZIP encoder failure
    #[error("zip encoding failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writer failure
    #[error("i/o error while encoding: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest could not be re-serialized
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Entry path rejected
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Errors loading pipeline configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML or unknown values
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Umbrella error for one export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Project has no stored files
    #[error("No files found for this project")]
    NoFiles,

    /// Files exist but none is `manifest.json`
    #[error("manifest.json not found in project files")]
    ManifestMissing,

    /// Manifest present but unusable
    #[error("Invalid manifest.json: {0}")]
    Manifest(#[from] ManifestError),

    /// Entry points or content scripts that no file satisfies
    #[error("Manifest references missing files: {}", paths.join(", "))]
    DanglingReferences { paths: Vec<String> },

    /// A bundled (non-icon) asset payload does not decode
    #[error("failed to decode asset {path}: {reason}")]
    AssetDecode { path: String, reason: String },

    /// Icon resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Archive encoding failed
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    /// File or asset lookup failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Deadline elapsed before the archive was complete
    #[error("export timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

impl ExportError {
    /// HTTP status for this failure
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoFiles => 404,
            Self::ManifestMissing
            | Self::Manifest(_)
            | Self::DanglingReferences { .. }
            | Self::AssetDecode { .. }
            | Self::Resolve(ResolveError::IconDecode { .. } | ResolveError::MissingIcons { .. }) => 400,
            Self::Timeout { .. } => 504,
            Self::Resolve(ResolveError::Store(_) | ResolveError::Scan(_))
            | Self::Assemble(_)
            | Self::Store(_) => 500,
        }
    }

    /// Paths a caller must supply before retrying, if any
    #[must_use]
    pub fn missing_paths(&self) -> Option<&[String]> {
        match self {
            Self::Resolve(ResolveError::MissingIcons { paths })
            | Self::DanglingReferences { paths } => Some(paths),
            _ => None,
        }
    }

    /// Path whose payload failed to decode, if any
    #[must_use]
    pub fn failing_path(&self) -> Option<&str> {
        match self {
            Self::Resolve(ResolveError::IconDecode { path, .. }) | Self::AssetDecode { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }

    /// JSON body describing this failure
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let error = match self {
            Self::Resolve(ResolveError::IconDecode { .. }) => "Failed to decode icon".to_string(),
            Self::Store(_) | Self::Resolve(ResolveError::Store(_)) => {
                "Failed to load project data".to_string()
            }
            Self::Assemble(_) | Self::Resolve(ResolveError::Scan(_)) => {
                "Failed to build extension archive".to_string()
            }
            other => other.to_string(),
        };
        ErrorBody {
            error,
            missing: self.missing_paths().map(<[String]>::to_vec),
            path: self.failing_path().map(str::to_string),
        }
    }
}

/// `{error, missing?, path?}` body returned with a non-200 status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
