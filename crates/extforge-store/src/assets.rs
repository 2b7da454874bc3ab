//! Per-project uploaded assets

use crate::error::AssetError;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use extforge_artifact::{is_icon_path, ArchivePath};
use extforge_core::{decode_payload, AssetKind, ProjectAsset, ProjectAssetStore, ProjectId, StoreResult};
use serde::{Deserialize, Serialize};

/// Largest accepted decoded upload
pub const MAX_ASSET_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types accepted for uploads
pub const ALLOWED_MIME_TYPES: [&str; 7] = [
    "image/png",
    "image/jpeg",
    "image/svg+xml",
    "application/json",
    "text/plain",
    "text/css",
    "text/html",
];

/// An upload before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpload {
    pub file_path: String,
    #[serde(default)]
    pub file_type: AssetKind,
    pub content_base64: String,
    pub mime_type: String,
}

impl AssetUpload {
    /// Upload of `path`; files under `icons/` are classified as icons
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        mime_type: impl Into<String>,
        content_base64: impl Into<String>,
    ) -> Self {
        let file_path = path.into();
        let file_type = if is_icon_path(&file_path) {
            AssetKind::Icon
        } else {
            AssetKind::Asset
        };
        Self {
            file_path,
            file_type,
            content_base64: content_base64.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Check the upload and return its decoded size
    ///
    /// # Errors
    /// Returns the first [`AssetError`] that applies.
    pub fn validate(&self) -> Result<u64, AssetError> {
        let path = ArchivePath::new(&self.file_path)?;

        if !ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(AssetError::UnsupportedMime {
                mime: self.mime_type.clone(),
            });
        }

        if self.file_type == AssetKind::Icon {
            if !path.is_icon() {
                return Err(AssetError::IconOutsideDir {
                    path: self.file_path.clone(),
                });
            }
            if !self.mime_type.starts_with("image/") {
                return Err(AssetError::IconNotImage {
                    mime: self.mime_type.clone(),
                });
            }
        }

        let size = decode_payload(&self.content_base64)?.len() as u64;
        if size > MAX_ASSET_BYTES {
            return Err(AssetError::TooLarge {
                size,
                limit: MAX_ASSET_BYTES,
            });
        }
        Ok(size)
    }
}

/// Project assets held in memory, unique per `(project, file_path)`
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: DashMap<(ProjectId, String), ProjectAsset>,
}

impl MemoryAssetStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert or replace an upload
    ///
    /// # Errors
    /// Returns [`AssetError`] if the upload is rejected; the store is left
    /// unchanged.
    pub fn upsert(
        &self,
        project: &ProjectId,
        upload: AssetUpload,
    ) -> Result<ProjectAsset, AssetError> {
        let file_size = upload.validate()?;
        let asset = ProjectAsset {
            project_id: project.clone(),
            file_path: upload.file_path,
            file_type: upload.file_type,
            content_base64: upload.content_base64,
            mime_type: upload.mime_type,
            file_size,
            updated_at: Utc::now(),
        };
        tracing::debug!(project = %project, path = %asset.file_path, size = file_size, "stored asset");
        self.assets.insert(
            (project.clone(), asset.file_path.clone()),
            asset.clone(),
        );
        Ok(asset)
    }

    /// Remove an asset, returning it if present
    pub fn delete(&self, project: &ProjectId, file_path: &str) -> Option<ProjectAsset> {
        self.assets
            .remove(&(project.clone(), file_path.to_string()))
            .map(|(_, asset)| asset)
    }

    /// Every asset of `project`, sorted by path
    #[must_use]
    pub fn list(&self, project: &ProjectId) -> Vec<ProjectAsset> {
        let mut assets: Vec<ProjectAsset> = self
            .assets
            .iter()
            .filter(|entry| &entry.key().0 == project)
            .map(|entry| entry.value().clone())
            .collect();
        assets.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        assets
    }

    /// Total assets across projects
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[async_trait]
impl ProjectAssetStore for MemoryAssetStore {
    async fn find_assets(
        &self,
        project: &ProjectId,
        paths: &[String],
    ) -> StoreResult<Vec<ProjectAsset>> {
        Ok(paths
            .iter()
            .filter_map(|path| {
                self.assets
                    .get(&(project.clone(), path.clone()))
                    .map(|entry| entry.value().clone())
            })
            .collect())
    }

    async fn list_assets(&self, project: &ProjectId) -> StoreResult<Vec<ProjectAsset>> {
        Ok(self.list(project))
    }
}
