//! Asset upload validation errors

use extforge_artifact::PathError;
use extforge_core::{DecodeFailure, StoreError};

/// Reasons an uploaded asset is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    /// Path is not a valid bundle path
    #[error("invalid asset path: {0}")]
    Path(#[from] PathError),

    /// MIME type outside the allow-list
    #[error("unsupported file type: {mime}")]
    UnsupportedMime { mime: String },

    /// Decoded payload exceeds the size limit
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// Icon stored outside `icons/`
    #[error("icon must be stored under icons/: {path}")]
    IconOutsideDir { path: String },

    /// Icon with a non-image MIME type
    #[error("icon must be an image, got {mime}")]
    IconNotImage { mime: String },

    /// Payload is not base64
    #[error("invalid payload: {0}")]
    Decode(#[from] DecodeFailure),
}

impl AssetError {
    /// Convert into a store rejection for `key`
    #[must_use]
    pub fn into_store_error(self, key: &str) -> StoreError {
        StoreError::Rejected {
            key: key.to_string(),
            reason: self.to_string(),
        }
    }
}
