//! Seeding stores from directories

use crate::assets::AssetUpload;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use extforge_artifact::ICON_DIR;
use extforge_core::{SharedIconRecord, StoreError, StoreResult, Visibility};
use sha2::{Digest, Sha256};
use std::path::Path;
use walkdir::WalkDir;

/// Pixel size encoded in an icon file stem (`bolt-16`, `bolt16`)
#[must_use]
pub fn parse_icon_size(stem: &str) -> Option<String> {
    let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    (digits > 0 && digits < stem.len()).then(|| stem[stem.len() - digits..].to_string())
}

/// MIME type for an upload, by extension
#[must_use]
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "svg" => Some("image/svg+xml"),
        "json" => Some("application/json"),
        "txt" => Some("text/plain"),
        "css" => Some("text/css"),
        "html" | "htm" => Some("text/html"),
        _ => None,
    }
}

fn read(path: &Path) -> StoreResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn walk_error(root: &Path, err: walkdir::Error) -> StoreError {
    StoreError::Io {
        path: err.path().unwrap_or(root).to_path_buf(),
        source: err.into(),
    }
}

/// Build shared icon records from a directory of PNG files
///
/// Only the top level is read. Each `name.png` (any extension case) becomes
/// `icons/name.png` in `visibility`, with its SHA-256 and any size encoded in
/// the name.
///
/// # Errors
/// Returns [`StoreError::Io`] if the directory or a file cannot be read.
pub fn import_icon_dir(
    dir: impl AsRef<Path>,
    visibility: &Visibility,
) -> StoreResult<Vec<SharedIconRecord>> {
    let dir = dir.as_ref();
    let mut records = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| walk_error(dir, err))?;
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !entry.file_type().is_file() || !is_png {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!(path = %path.display(), "skipping icon with non UTF-8 name");
            continue;
        };

        let bytes = read(path)?;
        let record = SharedIconRecord {
            path_hint: format!("{ICON_DIR}/{stem}.png"),
            visibility: visibility.clone(),
            content_base64: STANDARD.encode(&bytes),
            mime: "image/png".to_string(),
            sizes: parse_icon_size(stem).into_iter().collect(),
            hash: hex::encode(Sha256::digest(&bytes)),
            updated_at: Utc::now(),
        };
        tracing::debug!(path = %record.path_hint, bytes = bytes.len(), "imported shared icon");
        records.push(record);
    }

    tracing::info!(dir = %dir.display(), icons = records.len(), "imported icon directory");
    Ok(records)
}

/// Build uploads from every supported file under `dir`
///
/// Paths are relative to `dir`; files under `icons/` upload as icons.
/// Files with unsupported extensions are skipped.
///
/// # Errors
/// Returns [`StoreError::Io`] if a file cannot be read.
pub fn load_asset_dir(dir: impl AsRef<Path>) -> StoreResult<Vec<AssetUpload>> {
    let dir = dir.as_ref();
    let mut uploads = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| walk_error(dir, err))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(relative) = path
            .strip_prefix(dir)
            .ok()
            .and_then(|rel| rel.to_str())
            .map(|rel| rel.replace('\\', "/"))
        else {
            continue;
        };
        let Some(mime) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_for_extension)
        else {
            tracing::debug!(path = %relative, "skipping unsupported asset");
            continue;
        };

        let bytes = read(path)?;
        uploads.push(AssetUpload::new(relative, mime, STANDARD.encode(bytes)));
    }
    Ok(uploads)
}
