//! Icon resolution
//!
//! Every icon the bundle needs is discovered from the manifest and from
//! `icons/<name>.png` references in source text, then looked up in two tiers:
//! the project's own uploads first, the shared icon store second.

mod decode;
mod resolver;
mod scan;

pub use decode::{decode_payload, DecodeFailure};
pub use resolver::{IconResolver, IconSource, ResolvedIcon, ResolvedIcons};
pub use scan::{collect_required_paths, references_in, scan_references};
