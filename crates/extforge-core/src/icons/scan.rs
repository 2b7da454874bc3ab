//! Icon reference discovery

use crate::error::ResolveError;
use extforge_artifact::{ArchivePath, FileSet};
use extforge_manifest::Manifest;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeSet;

static ICON_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)icons/[A-Za-z0-9_-]+\.png").expect("icon reference pattern"));

const PREFIX_LEN: usize = "icons/".len();
const SUFFIX_LEN: usize = ".png".len();

/// Icon paths referenced in one source text, normalized to a lower-case
/// `icons/` prefix and `.png` extension. The name keeps its case.
#[must_use]
pub fn references_in(text: &str) -> BTreeSet<String> {
    ICON_REFERENCE
        .find_iter(text)
        .map(|m| {
            let raw = m.as_str();
            let name = &raw[PREFIX_LEN..raw.len() - SUFFIX_LEN];
            format!("icons/{name}.png")
        })
        .collect()
}

/// References across many texts, scanned in parallel
#[must_use]
pub fn scan_references<S: AsRef<str> + Sync>(texts: &[S]) -> BTreeSet<String> {
    texts
        .par_iter()
        .map(|text| references_in(text.as_ref()))
        .reduce(BTreeSet::new, |mut acc, found| {
            acc.extend(found);
            acc
        })
}

/// Every icon path the bundle needs
///
/// Union of the manifest's declared icon paths under `icons/` and the
/// references found in non-icon text files. Declared paths elsewhere are
/// ordinary bundle files and are not looked up. Unbundleable paths are kept
/// so they surface as missing. The scan runs on the blocking pool.
///
/// # Errors
/// Returns [`ResolveError::Scan`] if the scan task panics or is cancelled.
pub async fn collect_required_paths(
    manifest: &Manifest,
    files: &FileSet,
) -> Result<BTreeSet<String>, ResolveError> {
    let texts: Vec<String> = files
        .source_texts()
        .map(|(_, text)| text.to_string())
        .collect();

    let scanned = tokio::task::spawn_blocking(move || scan_references(&texts))
        .await
        .map_err(|err| ResolveError::Scan(err.to_string()))?;

    let mut required: BTreeSet<String> = manifest
        .declared_icon_paths()
        .into_iter()
        .filter(|raw| ArchivePath::new(raw).map_or(true, |path| path.is_icon()))
        .map(str::to_string)
        .collect();
    let declared = required.len();
    required.extend(scanned);

    tracing::debug!(
        declared,
        referenced = required.len() - declared,
        "collected required icon paths"
    );
    Ok(required)
}
