//! Project source files
//!
//! [`MemoryCodeFileStore`] keeps one [`FileSet`] per project. Directory helpers
//! convert between a [`FileSet`] and a tree on disk: valid UTF-8 files load as
//! text, everything else as binary.

use async_trait::async_trait;
use dashmap::DashMap;
use extforge_artifact::{ArchivePath, FileContent, FileSet};
use extforge_core::{CodeFileStore, ProjectId, StoreError, StoreResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Bundle-relative path of `path` under `root`, `/`-separated
fn relative_path(root: &Path, path: &Path) -> StoreResult<ArchivePath> {
    let relative = path.strip_prefix(root).map_err(|_| StoreError::Corrupt {
        key: path.display().to_string(),
        reason: "outside of project root".to_string(),
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component.as_os_str().to_str().ok_or_else(|| StoreError::Corrupt {
            key: path.display().to_string(),
            reason: "file name is not UTF-8".to_string(),
        })?;
        segments.push(segment);
    }

    ArchivePath::new(segments.join("/")).map_err(|err| StoreError::Corrupt {
        key: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Read every file under `dir` into a [`FileSet`]
///
/// A missing directory yields an empty set.
///
/// # Errors
/// Returns [`StoreError::Io`] if a file cannot be read, or
/// [`StoreError::Corrupt`] if a file name cannot be a bundle path.
pub fn load_file_set(dir: impl AsRef<Path>) -> StoreResult<FileSet> {
    let dir = dir.as_ref();
    let mut files = FileSet::new();
    if !dir.exists() {
        return Ok(files);
    }

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            StoreError::Io {
                path,
                source: err.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = relative_path(dir, entry.path())?;
        let bytes = std::fs::read(entry.path()).map_err(|err| io_error(entry.path(), err))?;
        files.insert(path, FileContent::from_bytes(bytes));
    }

    tracing::debug!(dir = %dir.display(), files = files.len(), "loaded file set");
    Ok(files)
}

/// Write `files` under `dir`, creating directories as needed
///
/// # Errors
/// Returns [`StoreError::Io`] on the first failed write.
pub fn write_file_set(dir: impl AsRef<Path>, files: &FileSet) -> StoreResult<()> {
    let dir = dir.as_ref();
    for (path, content) in files.iter() {
        let target = path
            .segments()
            .fold(dir.to_path_buf(), |acc, segment| acc.join(segment));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;
        }
        std::fs::write(&target, content.as_bytes()).map_err(|err| io_error(&target, err))?;
    }
    Ok(())
}

/// Project files held in memory
#[derive(Debug, Default)]
pub struct MemoryCodeFileStore {
    projects: DashMap<ProjectId, FileSet>,
}

impl MemoryCodeFileStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the files of `project`
    pub fn put(&self, project: impl Into<ProjectId>, files: FileSet) -> Option<FileSet> {
        self.projects.insert(project.into(), files)
    }

    /// Remove a project
    pub fn remove(&self, project: &ProjectId) -> Option<FileSet> {
        self.projects.remove(project).map(|(_, files)| files)
    }
}

#[async_trait]
impl CodeFileStore for MemoryCodeFileStore {
    async fn load_files(&self, project: &ProjectId) -> StoreResult<FileSet> {
        Ok(self
            .projects
            .get(project)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

/// Project files on disk, one directory per project under `root`
#[derive(Debug, Clone)]
pub struct DirCodeFileStore {
    root: PathBuf,
}

impl DirCodeFileStore {
    /// Serve projects from `root/<project id>/`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding `project`
    ///
    /// # Errors
    /// Returns [`StoreError::Rejected`] if the id is not a single path
    /// segment.
    pub fn project_dir(&self, project: &ProjectId) -> StoreResult<PathBuf> {
        let segment = ArchivePath::new(project.as_str())
            .ok()
            .filter(|path| path.segments().count() == 1)
            .ok_or_else(|| StoreError::Rejected {
                key: project.to_string(),
                reason: "project id must be a single path segment".to_string(),
            })?;
        Ok(self.root.join(segment.as_str()))
    }
}

#[async_trait]
impl CodeFileStore for DirCodeFileStore {
    async fn load_files(&self, project: &ProjectId) -> StoreResult<FileSet> {
        let dir = self.project_dir(project)?;
        tokio::task::spawn_blocking(move || load_file_set(dir))
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = FileSet::from_pairs([
            ("manifest.json", "{}"),
            ("scripts/content.js", "run();"),
        ])
        .unwrap();
        files.insert(
            ArchivePath::new("icons/icon16.png").unwrap(),
            vec![0x89, 0x50, 0xFF, 0xFE],
        );

        write_file_set(dir.path(), &files).unwrap();
        let loaded = load_file_set(dir.path()).unwrap();

        assert_eq!(loaded, files);
        assert!(!loaded.get("icons/icon16.png").unwrap().is_text());
    }

    #[test]
    fn missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_file_set(dir.path().join("nope")).unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn memory_store_unknown_project_is_empty() {
        let store = MemoryCodeFileStore::new();
        store.put("p1", FileSet::from_pairs([("a.js", "1")]).unwrap());
        assert_eq!(store.load_files(&ProjectId::from("p1")).await.unwrap().len(), 1);
        assert!(store.load_files(&ProjectId::from("p2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dir_store_reads_project_subdir() {
        let root = tempfile::tempdir().unwrap();
        let files = FileSet::from_pairs([("manifest.json", "{\"name\":\"d\"}")]).unwrap();
        write_file_set(root.path().join("demo"), &files).unwrap();

        let store = DirCodeFileStore::new(root.path());
        let loaded = store.load_files(&ProjectId::from("demo")).await.unwrap();
        assert_eq!(loaded, files);
    }

    #[tokio::test]
    async fn dir_store_rejects_nested_ids() {
        let store = DirCodeFileStore::new("/tmp");
        let err = store.load_files(&ProjectId::from("../etc")).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
    }
}
