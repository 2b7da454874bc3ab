//! extforge Stores
//!
//! Store backends for the export pipeline:
//! - [`MemoryCodeFileStore`] / [`DirCodeFileStore`]: project source files
//! - [`MemoryAssetStore`]: validated per-project uploads (tier 1 icons)
//! - [`MemorySharedIconStore`] / [`CachedSharedIconStore`]: shared icons
//!   (tier 2)
//!
//! plus directory helpers to seed them ([`import_icon_dir`],
//! [`load_asset_dir`], [`load_file_set`]).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod assets;
pub mod error;
pub mod files;
pub mod import;
pub mod shared;

pub use assets::{AssetUpload, MemoryAssetStore, ALLOWED_MIME_TYPES, MAX_ASSET_BYTES};
pub use error::AssetError;
pub use files::{load_file_set, write_file_set, DirCodeFileStore, MemoryCodeFileStore};
pub use import::{import_icon_dir, load_asset_dir, mime_for_extension, parse_icon_size};
pub use shared::{CacheStats, CachedSharedIconStore, MemorySharedIconStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
