//! Subcommand implementations
//!
//! Each command returns a serializable summary; printing and exit codes are
//! left to the binary.

use anyhow::{bail, Context, Result};
use extforge_core::{
    EntryPointPolicy, ExportPipeline, ExportRequest, PipelineConfig, ProjectId,
    StructuralValidator, ValidationReport, Visibility,
};
use extforge_store::{
    import_icon_dir, load_asset_dir, load_file_set, write_file_set, CachedSharedIconStore,
    MemoryAssetStore, MemoryCodeFileStore, MemorySharedIconStore,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Project id used for trees loaded from disk
const LOCAL_PROJECT: &str = "local";

/// Pipeline configuration from an optional TOML file
///
/// # Errors
/// Fails if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(PipelineConfig::new()),
    }
}

/// Result of `validate`
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub report: ValidationReport,
    /// Manifest after repair
    pub manifest: serde_json::Value,
    /// Files rewritten in place, when `--write` was given
    pub written: bool,
}

/// Run the integrity pass over a project directory
///
/// With `write`, repaired files and the re-serialized manifest are written
/// back to `dir`.
///
/// # Errors
/// Fails if the tree cannot be read, `manifest.json` is missing or
/// unparseable, or a write fails.
pub fn validate_project(
    dir: &Path,
    policy: EntryPointPolicy,
    write: bool,
) -> Result<ValidationSummary> {
    let files = load_file_set(dir).with_context(|| format!("reading {}", dir.display()))?;
    if files.is_empty() {
        bail!("no files found under {}", dir.display());
    }

    let outcome = StructuralValidator::new(policy)
        .validate_files(files)
        .with_context(|| format!("validating {}", dir.display()))?;

    tracing::info!(
        repairs = outcome.report.repairs.len(),
        dropped = outcome.report.dropped_entries.len(),
        warnings = outcome.report.warnings.len(),
        "validated project"
    );

    if write {
        write_file_set(dir, &outcome.files)
            .with_context(|| format!("writing repaired files to {}", dir.display()))?;
    }

    Ok(ValidationSummary {
        manifest: serde_json::from_str(&outcome.manifest_text)?,
        report: outcome.report,
        written: write,
    })
}

/// Inputs of `export`
#[derive(Debug, Clone)]
pub struct ExportArgs {
    pub project_dir: PathBuf,
    /// Per-project uploads; files under `icons/` become tier 1 icons
    pub assets_dir: Option<PathBuf>,
    /// Flat directory of shared PNG icons
    pub icons_dir: Option<PathBuf>,
    /// Target file, or a directory to place the archive in
    pub out: PathBuf,
    pub display_name: Option<String>,
}

/// Result of `export`
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: usize,
    pub entries: usize,
    pub icons_from_project: usize,
    pub icons_from_shared: usize,
    pub bundled_assets: usize,
    pub digest: String,
}

/// Package a project directory into a ZIP archive
///
/// Pipeline failures are returned with their [`extforge_core::ExportError`]
/// intact, so callers can `downcast_ref` it.
///
/// # Errors
/// Fails if an input directory cannot be read, an upload is rejected, the
/// export fails, or the archive cannot be written.
pub async fn export_project(config: PipelineConfig, args: &ExportArgs) -> Result<ExportSummary> {
    let project = ProjectId::from(LOCAL_PROJECT);

    let files = Arc::new(MemoryCodeFileStore::new());
    let tree = load_file_set(&args.project_dir)
        .with_context(|| format!("reading {}", args.project_dir.display()))?;
    files.put(project.clone(), tree);

    let assets = Arc::new(MemoryAssetStore::new());
    if let Some(dir) = &args.assets_dir {
        let uploads =
            load_asset_dir(dir).with_context(|| format!("reading assets from {}", dir.display()))?;
        for upload in uploads {
            let path = upload.file_path.clone();
            assets
                .upsert(&project, upload)
                .with_context(|| format!("rejected upload {path}"))?;
        }
    }

    let shared = MemorySharedIconStore::new();
    if let Some(dir) = &args.icons_dir {
        let records = import_icon_dir(dir, &config.shared_icon_visibility)
            .with_context(|| format!("importing icons from {}", dir.display()))?;
        shared.upsert_all(records);
    }
    let shared = Arc::new(CachedSharedIconStore::from_config(shared, &config));

    let pipeline = ExportPipeline::new(config, files, assets, shared);
    let mut request = ExportRequest::new(project);
    if let Some(name) = &args.display_name {
        request = request.with_display_name(name.clone());
    }
    let exported = pipeline.export(&request).await?;

    let path = if args.out.is_dir() {
        args.out.join(&exported.archive.file_name)
    } else {
        args.out.clone()
    };
    std::fs::write(&path, &exported.archive.bytes)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = exported.archive.bytes.len(), "archive written");

    Ok(ExportSummary {
        path,
        file_name: exported.archive.file_name,
        bytes: exported.archive.bytes.len(),
        entries: exported.archive.entry_count,
        icons_from_project: exported.icons_from_project,
        icons_from_shared: exported.icons_from_shared,
        bundled_assets: exported.bundled_assets,
        digest: exported.archive.digest.to_string(),
    })
}

/// One icon as `import-icons` would store it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedIcon {
    pub path_hint: String,
    pub visibility: Visibility,
    pub sizes: Vec<String>,
    pub hash: String,
}

/// Preview the shared icon records a directory would produce
///
/// # Errors
/// Fails if the directory cannot be read.
pub fn import_icons(dir: &Path, visibility: &Visibility) -> Result<Vec<ImportedIcon>> {
    let records = import_icon_dir(dir, visibility)
        .with_context(|| format!("importing icons from {}", dir.display()))?;
    Ok(records
        .into_iter()
        .map(|record| ImportedIcon {
            path_hint: record.path_hint,
            visibility: record.visibility,
            sizes: record.sizes,
            hash: record.hash,
        })
        .collect())
}
