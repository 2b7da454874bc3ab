//! Storage seams
//!
//! The pipeline only reads from storage. Backends implement these traits;
//! in-memory and directory-backed implementations live in `extforge-store`.

use crate::error::StoreResult;
use crate::types::{ProjectAsset, ProjectId, SharedIconRecord, Visibility};
use async_trait::async_trait;
use extforge_artifact::FileSet;
use std::sync::Arc;

/// Source files of a project
#[async_trait]
pub trait CodeFileStore: Send + Sync {
    /// All files of `project`; an unknown project yields an empty set
    async fn load_files(&self, project: &ProjectId) -> StoreResult<FileSet>;
}

/// Per-project uploaded assets (tier 1)
#[async_trait]
pub trait ProjectAssetStore: Send + Sync {
    /// Assets of `project` whose `file_path` is one of `paths`
    async fn find_assets(
        &self,
        project: &ProjectId,
        paths: &[String],
    ) -> StoreResult<Vec<ProjectAsset>>;

    /// Every asset of `project`
    async fn list_assets(&self, project: &ProjectId) -> StoreResult<Vec<ProjectAsset>>;
}

/// Shared icon repository (tier 2)
#[async_trait]
pub trait SharedIconStore: Send + Sync {
    /// Icons in `visibility` whose `path_hint` is one of `paths`
    async fn find_icons(
        &self,
        visibility: &Visibility,
        paths: &[String],
    ) -> StoreResult<Vec<SharedIconRecord>>;
}

#[async_trait]
impl<T: CodeFileStore + ?Sized> CodeFileStore for Arc<T> {
    async fn load_files(&self, project: &ProjectId) -> StoreResult<FileSet> {
        (**self).load_files(project).await
    }
}

#[async_trait]
impl<T: ProjectAssetStore + ?Sized> ProjectAssetStore for Arc<T> {
    async fn find_assets(
        &self,
        project: &ProjectId,
        paths: &[String],
    ) -> StoreResult<Vec<ProjectAsset>> {
        (**self).find_assets(project, paths).await
    }

    async fn list_assets(&self, project: &ProjectId) -> StoreResult<Vec<ProjectAsset>> {
        (**self).list_assets(project).await
    }
}

#[async_trait]
impl<T: SharedIconStore + ?Sized> SharedIconStore for Arc<T> {
    async fn find_icons(
        &self,
        visibility: &Visibility,
        paths: &[String],
    ) -> StoreResult<Vec<SharedIconRecord>> {
        (**self).find_icons(visibility, paths).await
    }
}
