//! extforge Artifact Primitives
//!
//! Building blocks shared by every stage of the packaging pipeline.
//!
//! # Core Concepts
//!
//! - [`ArchivePath`]: validated bundle-relative path
//! - [`FileSet`]: path → text/binary content for one project
//! - [`ResolvedArtifact`]: ordered archive entries ready for encoding
//! - [`ContentHash`]: 32-byte Blake3 hash of entry bytes
//!
//! # Example
//!
//! ```rust
//! use extforge_artifact::{ArchiveEntry, ArchivePath, FileSet, ResolvedArtifact};
//!
//! let files = FileSet::from_pairs([("content.js", "console.log('hi')")]).unwrap();
//! let mut artifact = ResolvedArtifact::new();
//! for (path, content) in files.iter() {
//!     artifact.put(path.clone(), ArchiveEntry::binary(content.as_bytes().to_vec()));
//! }
//! assert!(artifact.contains("content.js"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod file_set;
mod hash;
mod path;

pub use artifact::{ArchiveEntry, EntryKind, ResolvedArtifact};
pub use file_set::{FileContent, FileSet};
pub use hash::ContentHash;
pub use path::{is_icon_path, ArchivePath, PathError, ICON_DIR};

/// Path of the manifest inside every bundle
pub const MANIFEST_PATH: &str = "manifest.json";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
