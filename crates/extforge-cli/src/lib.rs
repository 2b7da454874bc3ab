//! extforge command line
//!
//! Runs the integrity pass and the export pipeline against project trees on
//! disk. Stores are seeded in memory from directories, so a run needs no
//! database.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
pub mod logging;

pub use commands::{
    export_project, import_icons, load_config, validate_project, ExportArgs, ExportSummary,
    ImportedIcon, ValidationSummary,
};
pub use logging::{init_tracing, LogFormat};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
