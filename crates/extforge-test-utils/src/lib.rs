//! Testing utilities for the extforge workspace
//!
//! Shared fixtures: sample manifests, fake PNG payloads and a
//! [`ProjectFixture`] that wires in-memory stores into an export pipeline.

#![allow(missing_docs)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use extforge_artifact::FileSet;
use extforge_core::{ExportPipeline, PipelineConfig, ProjectId, SharedIconRecord, Visibility};
use extforge_manifest::CANONICAL_ICONS;
use extforge_store::{AssetUpload, MemoryAssetStore, MemoryCodeFileStore, MemorySharedIconStore};
use std::sync::Arc;

/// PNG signature
pub const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A typical generated manifest with one content script and a popup
pub const SAMPLE_MANIFEST: &str = r#"{
  "manifest_version": 3,
  "name": "Page Highlighter",
  "version": "1.0.0",
  "description": "Highlights things",
  "permissions": ["storage", "activeTab"],
  "action": { "default_popup": "popup.html", "default_title": "Highlight" },
  "background": { "service_worker": "background.js" },
  "content_scripts": [
    { "matches": ["<all_urls>"], "js": ["content.js"], "css": ["content.css"] }
  ]
}"#;

/// PNG-looking bytes distinguishable by `tag`
pub fn png_bytes(tag: &str) -> Vec<u8> {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(tag.as_bytes());
    bytes
}

/// Base64 of [`png_bytes`]
pub fn png_base64(tag: &str) -> String {
    STANDARD.encode(png_bytes(tag))
}

/// Global shared icon at `path` with an explicit payload
pub fn shared_icon(path: &str, content_base64: impl Into<String>) -> SharedIconRecord {
    SharedIconRecord {
        path_hint: path.to_string(),
        visibility: Visibility::global(),
        content_base64: content_base64.into(),
        mime: "image/png".to_string(),
        sizes: Vec::new(),
        hash: String::new(),
        updated_at: Utc::now(),
    }
}

/// File set from `(path, text)` pairs
pub fn file_set(pairs: &[(&str, &str)]) -> FileSet {
    FileSet::from_pairs(pairs.iter().copied()).unwrap()
}

/// Sample project: [`SAMPLE_MANIFEST`] plus working scripts and pages
pub fn sample_files() -> FileSet {
    file_set(&[
        ("manifest.json", SAMPLE_MANIFEST),
        ("content.js", "document.body.classList.add('hl');"),
        ("content.css", ".hl { outline: 1px solid red; }"),
        ("background.js", "chrome.runtime.onInstalled.addListener(() => {});"),
        ("popup.html", "<html><body><script src=\"popup.js\"></script></body></html>"),
        ("popup.js", "console.log('popup');"),
    ])
}

/// In-memory stores for one project, ready to build a pipeline
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    pub project: ProjectId,
    pub files: Arc<MemoryCodeFileStore>,
    pub assets: Arc<MemoryAssetStore>,
    pub shared: Arc<MemorySharedIconStore>,
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new("project-1")
    }
}

impl ProjectFixture {
    /// Empty stores for `project`
    pub fn new(project: &str) -> Self {
        Self {
            project: ProjectId::from(project),
            files: Arc::new(MemoryCodeFileStore::new()),
            assets: Arc::new(MemoryAssetStore::new()),
            shared: Arc::new(MemorySharedIconStore::new()),
        }
    }

    /// Store the project's files
    #[must_use]
    pub fn with_files(self, files: FileSet) -> Self {
        self.files.put(self.project.clone(), files);
        self
    }

    /// Upload a PNG for this project
    #[must_use]
    pub fn with_uploaded_icon(self, path: &str, tag: &str) -> Self {
        self.assets
            .upsert(&self.project, AssetUpload::new(path, "image/png", png_base64(tag)))
            .unwrap();
        self
    }

    /// Upload any asset for this project
    #[must_use]
    pub fn with_upload(self, upload: AssetUpload) -> Self {
        self.assets.upsert(&self.project, upload).unwrap();
        self
    }

    /// Add a global shared icon
    #[must_use]
    pub fn with_shared_icon(self, path: &str, tag: &str) -> Self {
        self.shared.upsert(shared_icon(path, png_base64(tag)));
        self
    }

    /// Add shared icons for every canonical default
    #[must_use]
    pub fn with_default_shared_icons(self) -> Self {
        for (_, path) in CANONICAL_ICONS {
            self.shared.upsert(shared_icon(path, png_base64(path)));
        }
        self
    }

    /// Pipeline over these stores
    pub fn pipeline(&self, config: PipelineConfig) -> ExportPipeline {
        ExportPipeline::new(
            config,
            self.files.clone(),
            self.assets.clone(),
            self.shared.clone(),
        )
    }
}
