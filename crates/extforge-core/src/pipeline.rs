//! Export pipeline
//!
//! Load → check references → resolve icons → assemble, bounded by a deadline.
//! Nothing is returned unless every stage succeeds, so a caller never sees a
//! partial archive.

use crate::assembler::{ArtifactAssembler, BundledArchive, BundledAsset};
use crate::config::PipelineConfig;
use crate::error::{ExportError, ValidationError};
use crate::icons::{decode_payload, IconResolver, IconSource};
use crate::store::{CodeFileStore, ProjectAssetStore, SharedIconStore};
use crate::types::ProjectId;
use crate::validator::{StructuralValidator, ValidationOutcome};
use extforge_artifact::{is_icon_path, ArchivePath, FileSet, MANIFEST_PATH};
use extforge_manifest::Manifest;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// One export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub project_id: ProjectId,
    /// Name used for the download file; falls back to the manifest name
    pub display_name: Option<String>,
}

impl ExportRequest {
    /// Export `project_id` under the manifest's own name
    #[must_use]
    pub fn new(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: project_id.into(),
            display_name: None,
        }
    }

    /// With an explicit download name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArchive {
    pub archive: BundledArchive,
    /// Manifest as shipped, after default-fill
    pub manifest_text: String,
    pub icons_from_project: usize,
    pub icons_from_shared: usize,
    pub bundled_assets: usize,
}

/// Packages stored projects into downloadable archives
#[derive(Clone)]
pub struct ExportPipeline {
    config: PipelineConfig,
    files: Arc<dyn CodeFileStore>,
    assets: Arc<dyn ProjectAssetStore>,
    validator: StructuralValidator,
    resolver: IconResolver,
    assembler: ArtifactAssembler,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExportPipeline {
    /// Create a pipeline over the given stores
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        files: Arc<dyn CodeFileStore>,
        assets: Arc<dyn ProjectAssetStore>,
        shared: Arc<dyn SharedIconStore>,
    ) -> Self {
        let validator = StructuralValidator::new(config.entry_point_policy);
        let resolver = IconResolver::new(
            Arc::clone(&assets),
            shared,
            config.shared_icon_visibility.clone(),
        );
        let assembler = ArtifactAssembler::new(config.archive_prefix.clone());
        Self {
            config,
            files,
            assets,
            validator,
            resolver,
            assembler,
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate a freshly generated file set before it is persisted
    ///
    /// # Errors
    /// See [`StructuralValidator::validate_files`].
    pub fn prepare_generated(&self, files: FileSet) -> Result<ValidationOutcome, ValidationError> {
        self.validator.validate_files(files)
    }

    /// Export one project
    ///
    /// # Errors
    /// Any [`ExportError`]; [`ExportError::Timeout`] if the configured
    /// deadline elapses first, in which case in-flight lookups are dropped.
    #[tracing::instrument(skip_all, fields(project = %request.project_id))]
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportedArchive, ExportError> {
        let started = Instant::now();
        let deadline = self.config.export_timeout();

        let result = match tokio::time::timeout(deadline, self.run(request)).await {
            Ok(result) => result,
            Err(_) => Err(ExportError::Timeout {
                after_ms: self.config.export_timeout_ms,
            }),
        };

        match &result {
            Ok(exported) => tracing::info!(
                file = %exported.archive.file_name,
                elapsed_ms = started.elapsed().as_millis(),
                "export complete"
            ),
            Err(err) => tracing::warn!(
                status = err.status_code(),
                error = %err,
                elapsed_ms = started.elapsed().as_millis(),
                "export failed"
            ),
        }
        result
    }

    async fn run(&self, request: &ExportRequest) -> Result<ExportedArchive, ExportError> {
        let project = &request.project_id;

        let files = self.files.load_files(project).await?;
        if files.is_empty() {
            return Err(ExportError::NoFiles);
        }
        let manifest_text = files
            .get_text(MANIFEST_PATH)
            .ok_or(ExportError::ManifestMissing)?;
        let mut manifest = Manifest::parse(manifest_text)?;
        tracing::debug!(files = files.len(), "loaded project files");

        let bundled = if self.config.bundle_project_assets {
            self.bundled_assets(project).await?
        } else {
            Vec::new()
        };

        check_references(&manifest, &files, &bundled)?;

        let icons = self.resolver.resolve(project, &mut manifest, &files).await?;

        let display_name = request
            .display_name
            .as_deref()
            .or_else(|| manifest.display_name())
            .unwrap_or_default()
            .to_string();
        let archive = self
            .assembler
            .assemble(&display_name, &files, &manifest, &icons, &bundled)?;

        Ok(ExportedArchive {
            archive,
            manifest_text: manifest.to_pretty_json()?,
            icons_from_project: icons.count_from(IconSource::ProjectAsset),
            icons_from_shared: icons.count_from(IconSource::SharedStore),
            bundled_assets: bundled.len(),
        })
    }

    /// Decoded non-icon uploads of `project`
    async fn bundled_assets(&self, project: &ProjectId) -> Result<Vec<BundledAsset>, ExportError> {
        let mut bundled = Vec::new();
        for asset in self.assets.list_assets(project).await? {
            if is_icon_path(&asset.file_path) {
                continue;
            }
            let path = match ArchivePath::new(&asset.file_path) {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(path = %asset.file_path, error = %err, "skipping asset with invalid path");
                    continue;
                }
            };
            let bytes =
                decode_payload(&asset.content_base64).map_err(|err| ExportError::AssetDecode {
                    path: asset.file_path.clone(),
                    reason: err.to_string(),
                })?;
            bundled.push(BundledAsset { path, bytes });
        }
        Ok(bundled)
    }
}

/// Fail if an entry point or content script file exists nowhere in the bundle
fn check_references(
    manifest: &Manifest,
    files: &FileSet,
    bundled: &[BundledAsset],
) -> Result<(), ExportError> {
    let shipped: BTreeSet<&str> = files
        .paths()
        .chain(bundled.iter().map(|asset| &asset.path))
        .map(ArchivePath::as_str)
        .collect();

    // Icons under `icons/` are resolved from the stores instead.
    let bundled_icons = manifest
        .declared_icon_paths()
        .into_iter()
        .filter_map(|raw| ArchivePath::new(raw).ok().filter(|path| !path.is_icon()))
        .map(ArchivePath::into_string);

    let declared = manifest
        .entry_points()
        .into_iter()
        .map(|entry| entry.path)
        .chain(manifest.content_script_files().into_iter().map(str::to_string))
        .chain(bundled_icons);

    let mut missing: Vec<String> = declared
        .filter(|raw| {
            ArchivePath::new(raw).map_or(true, |path| !shipped.contains(path.as_str()))
        })
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    missing.dedup();
    tracing::warn!(missing = ?missing, "manifest references files that do not exist");
    Err(ExportError::DanglingReferences { paths: missing })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_satisfied_by_files_or_assets() {
        let manifest = Manifest::parse(
            r#"{"background": {"service_worker": "./bg.js"},
                "content_scripts": [{"matches": ["<all_urls>"], "css": ["style.css"]}]}"#,
        )
        .unwrap();
        let files = FileSet::from_pairs([("bg.js", "run();")]).unwrap();
        let bundled = vec![BundledAsset {
            path: ArchivePath::new("style.css").unwrap(),
            bytes: b"a{}".to_vec(),
        }];

        assert!(check_references(&manifest, &files, &bundled).is_ok());
        let err = check_references(&manifest, &files, &[]).unwrap_err();
        assert!(matches!(
            err,
            ExportError::DanglingReferences { ref paths } if paths == &["style.css".to_string()]
        ));
    }

    #[test]
    fn invalid_reference_counts_as_missing() {
        let manifest =
            Manifest::parse(r#"{"action": {"default_popup": "../popup.html"}}"#).unwrap();
        let err = check_references(&manifest, &FileSet::new(), &[]).unwrap_err();
        assert_eq!(err.missing_paths().unwrap(), ["../popup.html".to_string()]);
    }

    #[test]
    fn icons_outside_icon_dir_must_be_bundled() {
        let manifest = Manifest::parse(
            r#"{"icons": {"16": "images/logo.png", "48": "icons/icon48.png"}}"#,
        )
        .unwrap();
        let mut files = FileSet::new();
        files.insert(ArchivePath::new("images/logo.png").unwrap(), vec![0x89, 0x50]);

        assert!(check_references(&manifest, &files, &[]).is_ok());
        let err = check_references(&manifest, &FileSet::new(), &[]).unwrap_err();
        assert_eq!(err.missing_paths().unwrap(), ["images/logo.png".to_string()]);
    }
}
