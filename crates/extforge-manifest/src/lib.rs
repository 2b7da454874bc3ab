//! extforge Manifest Model
//!
//! Typed, shape-tolerant model of a browser extension `manifest.json`.
//!
//! # Architecture
//!
//! ```text
//! manifest text → Manifest::parse → Manifest (Lenient fields) → repair / fill → to_pretty_json
//! ```
//!
//! Parsing fails only when the text is not a JSON object. Wrong shapes under
//! modelled keys are kept as [`Lenient::Raw`] and normalized explicitly by
//! the stage that needs them (see [`Manifest::fill_default_icons`]).
//!
//! # Example
//!
//! ```rust
//! use extforge_manifest::Manifest;
//!
//! let mut manifest = Manifest::parse(r#"{"icons": {"128": "icons/icon128.png"}}"#).unwrap();
//! manifest.fill_default_icons();
//! assert_eq!(manifest.declared_icon_paths().len(), 3);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod icons;
pub mod lenient;
pub mod manifest;

pub use error::{ManifestError, ManifestResult};
pub use icons::{fill_canonical, IconFill, CANONICAL_ICONS};
pub use lenient::Lenient;
pub use manifest::{
    Action, Background, ContentScriptEntry, EntryPoint, EntryPointKind, IconMap, Manifest,
    SidePanel,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
