//! extforge Core - integrity repair and packaging
//!
//! Turns a generated extension project into something a browser will load:
//! - Repairs blank or missing content scripts and unusable manifest entries
//! - Default-fills canonical icons and resolves every referenced icon from
//!   project uploads or the shared icon store
//! - Assembles a deterministic ZIP archive for download
//!
//! # Example
//!
//! ```rust,ignore
//! use extforge_core::{ExportPipeline, ExportRequest, ExportResponse, PipelineConfig};
//!
//! # async fn example(files: std::sync::Arc<dyn extforge_core::CodeFileStore>,
//! #                  assets: std::sync::Arc<dyn extforge_core::ProjectAssetStore>,
//! #                  shared: std::sync::Arc<dyn extforge_core::SharedIconStore>) {
//! let pipeline = ExportPipeline::new(PipelineConfig::new(), files, assets, shared);
//! let result = pipeline.export(&ExportRequest::new("project-42")).await;
//! let response = ExportResponse::from_result(result);
//! println!("{} ({} bytes)", response.status, response.body.len());
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod assembler;
pub mod config;
pub mod error;
pub mod icons;
pub mod pipeline;
pub mod response;
pub mod store;
pub mod stubs;
pub mod types;
pub mod validator;

pub use assembler::{archive_file_name, ArtifactAssembler, BundledArchive, BundledAsset};
pub use config::{EntryPointPolicy, PipelineConfig};
pub use error::{
    AssembleError, ConfigError, ErrorBody, ExportError, PayloadOrigin, ResolveError, StoreError,
    StoreResult, ValidationError,
};
pub use icons::{
    collect_required_paths, decode_payload, DecodeFailure, IconResolver, IconSource,
    ResolvedIcon, ResolvedIcons,
};
pub use pipeline::{ExportPipeline, ExportRequest, ExportedArchive};
pub use response::ExportResponse;
pub use store::{CodeFileStore, ProjectAssetStore, SharedIconStore};
pub use stubs::StubTemplates;
pub use types::{AssetKind, ProjectAsset, ProjectId, SharedIconRecord, Visibility};
pub use validator::{
    is_blank_source, StructuralValidator, ValidationOutcome, ValidationReport, ValidationWarning,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with extforge Core
    pub use crate::{
        CodeFileStore, EntryPointPolicy, ExportError, ExportPipeline, ExportRequest,
        ExportResponse, PipelineConfig, ProjectAssetStore, ProjectId, SharedIconStore,
        StructuralValidator, Visibility,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use async_trait::async_trait;
    use extforge_artifact::FileSet;
    use std::sync::Arc;
    use std::time::Duration;

    struct Files(FileSet);

    #[async_trait]
    impl CodeFileStore for Files {
        async fn load_files(&self, _project: &ProjectId) -> StoreResult<FileSet> {
            Ok(self.0.clone())
        }
    }

    struct NoAssets;

    #[async_trait]
    impl ProjectAssetStore for NoAssets {
        async fn find_assets(
            &self,
            _project: &ProjectId,
            _paths: &[String],
        ) -> StoreResult<Vec<ProjectAsset>> {
            Ok(Vec::new())
        }

        async fn list_assets(&self, _project: &ProjectId) -> StoreResult<Vec<ProjectAsset>> {
            Ok(Vec::new())
        }
    }

    /// Shared store that never answers
    struct Stalled;

    #[async_trait]
    impl SharedIconStore for Stalled {
        async fn find_icons(
            &self,
            _visibility: &Visibility,
            _paths: &[String],
        ) -> StoreResult<Vec<SharedIconRecord>> {
            futures::future::pending().await
        }
    }

    fn pipeline(files: FileSet, config: PipelineConfig) -> ExportPipeline {
        ExportPipeline::new(
            config,
            Arc::new(Files(files)),
            Arc::new(NoAssets),
            Arc::new(Stalled),
        )
    }

    #[tokio::test]
    async fn empty_project_is_not_found() {
        let pipeline = pipeline(FileSet::new(), PipelineConfig::new());
        let err = pipeline.export(&ExportRequest::new("p")).await.unwrap_err();
        assert!(matches!(err, ExportError::NoFiles));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn missing_manifest_is_bad_request() {
        let files = FileSet::from_pairs([("content.js", "run();")]).unwrap();
        let err = pipeline(files, PipelineConfig::new())
            .export(&ExportRequest::new("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::ManifestMissing));
    }

    #[tokio::test]
    async fn stalled_lookup_times_out() {
        let files = FileSet::from_pairs([("manifest.json", r#"{"name": "slow"}"#)]).unwrap();
        let config = PipelineConfig::new().with_export_timeout(Duration::from_millis(50));
        let response = ExportResponse::from_result(
            pipeline(files, config).export(&ExportRequest::new("p")).await,
        );
        assert_eq!(response.status, 504);
    }

    #[test]
    fn prepare_generated_uses_configured_policy() {
        let files = FileSet::from_pairs([(
            "manifest.json",
            r#"{"name": "Gen", "action": {"default_popup": "popup.html"}}"#,
        )])
        .unwrap();
        let config = PipelineConfig::new().with_entry_point_policy(EntryPointPolicy::Stub);
        let outcome = pipeline(FileSet::new(), config)
            .prepare_generated(files)
            .unwrap();
        assert!(outcome.files.contains("popup.html"));
    }
}
