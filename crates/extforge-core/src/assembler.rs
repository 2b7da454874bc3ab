//! Archive assembly
//!
//! Builds the [`ResolvedArtifact`] for an export and encodes it as a ZIP.
//! Entries are sorted by path and stamped with a fixed timestamp, so the same
//! input always produces the same bytes.

use crate::error::AssembleError;
use crate::icons::ResolvedIcons;
use extforge_artifact::{
    ArchiveEntry, ArchivePath, ContentHash, FileContent, FileSet, ResolvedArtifact, MANIFEST_PATH,
};
use extforge_manifest::Manifest;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// A decoded uploaded asset to ship alongside the source files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledAsset {
    pub path: ArchivePath,
    pub bytes: Vec<u8>,
}

/// Encoded archive plus what went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledArchive {
    /// Download file name, `.zip` included
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Digest over every `(path, content hash)` pair
    pub digest: ContentHash,
    pub entry_count: usize,
    pub icon_count: usize,
}

/// Download file name for an extension
///
/// Every character outside `[A-Za-z0-9_-]` becomes `-` and the result is
/// lower-cased. An empty name yields `extension`.
#[must_use]
pub fn archive_file_name(display_name: &str, prefix: &str) -> String {
    let sanitized: String = display_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let stem = if sanitized.is_empty() {
        "extension"
    } else {
        sanitized.as_str()
    };
    format!("{prefix}{stem}.zip")
}

/// Builds export archives
#[derive(Debug, Clone, Default)]
pub struct ArtifactAssembler {
    prefix: String,
}

impl ArtifactAssembler {
    /// Create an assembler using `prefix` for file names
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Collect every archive entry
    ///
    /// Later writes win: source files, then bundled assets, then the
    /// re-serialized manifest, then resolved icons. Source files under
    /// `icons/` are skipped; icons only come from resolution.
    ///
    /// # Errors
    /// Returns [`AssembleError::Manifest`] if the manifest cannot be
    /// serialized.
    pub fn compose(
        &self,
        files: &FileSet,
        manifest: &Manifest,
        icons: &ResolvedIcons,
        assets: &[BundledAsset],
    ) -> Result<ResolvedArtifact, AssembleError> {
        let mut artifact = ResolvedArtifact::new();

        for (path, content) in files.iter().filter(|(path, _)| !path.is_icon()) {
            let entry = match content {
                FileContent::Text(text) => ArchiveEntry::text(text.as_str()),
                FileContent::Binary(bytes) => ArchiveEntry::binary(bytes.clone()),
            };
            artifact.put(path.clone(), entry);
        }

        for asset in assets.iter().filter(|asset| !asset.path.is_icon()) {
            if artifact
                .put(asset.path.clone(), ArchiveEntry::binary(asset.bytes.clone()))
                .is_some()
            {
                tracing::debug!(path = %asset.path, "uploaded asset replaces project file");
            }
        }

        artifact.put(
            ArchivePath::new(MANIFEST_PATH)?,
            ArchiveEntry::text(manifest.to_pretty_json()?),
        );

        for (path, icon) in icons.iter() {
            artifact.put(path.clone(), ArchiveEntry::binary(icon.bytes.clone()));
        }

        artifact.sort_by_path();
        Ok(artifact)
    }

    /// Encode an artifact as ZIP bytes
    ///
    /// # Errors
    /// Returns [`AssembleError::Zip`] or [`AssembleError::Io`] if encoding
    /// fails.
    pub fn encode(artifact: &ResolvedArtifact) -> Result<Vec<u8>, AssembleError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, entry) in artifact.iter() {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(entry.bytes())?;
        }
        Ok(zip.finish()?.into_inner())
    }

    /// Compose and encode in one step
    ///
    /// # Errors
    /// See [`ArtifactAssembler::compose`] and [`ArtifactAssembler::encode`].
    #[tracing::instrument(skip_all, fields(name = %display_name))]
    pub fn assemble(
        &self,
        display_name: &str,
        files: &FileSet,
        manifest: &Manifest,
        icons: &ResolvedIcons,
        assets: &[BundledAsset],
    ) -> Result<BundledArchive, AssembleError> {
        let artifact = self.compose(files, manifest, icons, assets)?;
        let bytes = Self::encode(&artifact)?;
        let archive = BundledArchive {
            file_name: archive_file_name(display_name, &self.prefix),
            digest: artifact.digest(),
            entry_count: artifact.len(),
            icon_count: artifact.icon_paths().count(),
            bytes,
        };
        tracing::info!(
            file = %archive.file_name,
            entries = archive.entry_count,
            icons = archive.icon_count,
            bytes = archive.bytes.len(),
            digest = %archive.digest.short(),
            "assembled extension archive"
        );
        Ok(archive)
    }
}
