//! Structural validation and repair of a generated file set
//!
//! Runs after generation and before persistence. The validator never fails on
//! a structural problem it can describe: blank or missing content scripts are
//! replaced with working defaults, unusable `content_scripts` entries are
//! dropped, and entry points are either stubbed or reported depending on the
//! configured [`EntryPointPolicy`]. Only an unparsable manifest is an error.
//!
//! Running the validator over its own output changes nothing.

use crate::config::EntryPointPolicy;
use crate::error::ValidationError;
use crate::stubs::StubTemplates;
use extforge_artifact::{ArchivePath, FileContent, FileSet, MANIFEST_PATH};
use extforge_manifest::{ContentScriptEntry, EntryPointKind, Lenient, Manifest};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern"));
static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)//.*$").expect("line comment pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Whether `source` has no content once comments and whitespace are removed
#[must_use]
pub fn is_blank_source(source: &str) -> bool {
    let stripped = BLOCK_COMMENT.replace_all(source, "");
    let stripped = LINE_COMMENT.replace_all(&stripped, "");
    WHITESPACE.replace_all(&stripped, "").is_empty()
}

fn is_blank(content: &FileContent) -> bool {
    match content {
        FileContent::Text(text) => is_blank_source(text),
        FileContent::Binary(bytes) => bytes.is_empty(),
    }
}

/// Kind of synthesized file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StubKind {
    ContentScript,
    ContentStyle,
    BackgroundScript,
    PopupPage,
    SidePanelPage,
}

/// Why a file was replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairReason {
    /// Declared but absent from the file set
    Missing,
    /// Present but empty or comment-only
    Blank,
}

/// One synthesized file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repair {
    pub path: String,
    pub stub: StubKind,
    pub reason: RepairReason,
}

/// Why a `content_scripts` entry was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Not an object with string `js`/`css` lists
    Malformed,
    /// No usable `js` or `css` path left
    NoFiles,
}

/// A removed `content_scripts` entry, by its original index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedEntry {
    pub index: usize,
    pub reason: DropReason,
}

/// Problems the validator reports but does not repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Declared entry point with no file behind it
    DanglingEntryPoint { entry: EntryPointKind, path: String },
    /// Declared path that can never be a bundle path
    InvalidPath { path: String, reason: String },
    /// `content_scripts` was not an array and was removed
    ContentScriptsNotArray,
}

/// Everything a validation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub repairs: Vec<Repair>,
    pub dropped_entries: Vec<DroppedEntry>,
    pub warnings: Vec<ValidationWarning>,
    /// `content_scripts` was removed because nothing usable remained
    pub content_scripts_removed: bool,
}

impl ValidationReport {
    /// Nothing repaired, dropped or warned about
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
            && self.dropped_entries.is_empty()
            && self.warnings.is_empty()
            && !self.content_scripts_removed
    }

    /// Paths of dangling entry points
    pub fn dangling_paths(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().filter_map(|warning| match warning {
            ValidationWarning::DanglingEntryPoint { path, .. } => Some(path.as_str()),
            _ => None,
        })
    }
}

/// Result of a validation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// File set with repairs applied and `manifest.json` replaced
    pub files: FileSet,
    pub manifest: Manifest,
    /// Re-serialized manifest, as written to `manifest.json`
    pub manifest_text: String,
    pub report: ValidationReport,
}

/// Repairs the structure of a generated extension
#[derive(Debug, Clone, Default)]
pub struct StructuralValidator {
    policy: EntryPointPolicy,
    templates: StubTemplates,
}

impl StructuralValidator {
    /// Create a validator with default templates
    #[must_use]
    pub fn new(policy: EntryPointPolicy) -> Self {
        Self {
            policy,
            templates: StubTemplates::default(),
        }
    }

    /// With custom stub templates
    #[must_use]
    pub fn with_templates(mut self, templates: StubTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Entry point policy in effect
    #[must_use]
    pub fn policy(&self) -> EntryPointPolicy {
        self.policy
    }

    /// Validate using the file set's own `manifest.json`
    ///
    /// # Errors
    /// - [`ValidationError::ManifestMissing`] if there is no text manifest
    /// - [`ValidationError::Manifest`] if it does not parse
    pub fn validate_files(&self, files: FileSet) -> Result<ValidationOutcome, ValidationError> {
        let manifest_text = files
            .get_text(MANIFEST_PATH)
            .ok_or(ValidationError::ManifestMissing)?
            .to_string();
        self.validate(files, &manifest_text)
    }

    /// Validate `files` against `manifest_text`
    ///
    /// # Errors
    /// Returns [`ValidationError::Manifest`] if `manifest_text` is not a JSON
    /// object.
    pub fn validate(
        &self,
        mut files: FileSet,
        manifest_text: &str,
    ) -> Result<ValidationOutcome, ValidationError> {
        let mut manifest = Manifest::parse(manifest_text)?;
        let mut report = ValidationReport::default();

        self.repair_content_scripts(&mut manifest, &mut files, &mut report);
        self.check_entry_points(&manifest, &mut files, &mut report);

        let manifest_text = manifest.to_pretty_json()?;
        files.insert(ArchivePath::new(MANIFEST_PATH)?, manifest_text.clone());

        if report.is_clean() {
            tracing::debug!(files = files.len(), "validation found nothing to repair");
        } else {
            tracing::info!(
                repairs = report.repairs.len(),
                dropped = report.dropped_entries.len(),
                warnings = report.warnings.len(),
                "validation repaired extension structure"
            );
        }

        Ok(ValidationOutcome {
            files,
            manifest,
            manifest_text,
            report,
        })
    }

    fn repair_content_scripts(
        &self,
        manifest: &mut Manifest,
        files: &mut FileSet,
        report: &mut ValidationReport,
    ) {
        let Some(scripts) = manifest.content_scripts.take() else {
            return;
        };

        let entries = match scripts {
            Lenient::Typed(entries) => entries,
            Lenient::Raw(_) => {
                tracing::warn!("content_scripts is not an array; removing it");
                report.warnings.push(ValidationWarning::ContentScriptsNotArray);
                report.content_scripts_removed = true;
                return;
            }
        };

        let mut kept = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let Lenient::Typed(mut entry) = entry else {
                tracing::warn!(index, "dropping malformed content_scripts entry");
                report.dropped_entries.push(DroppedEntry {
                    index,
                    reason: DropReason::Malformed,
                });
                continue;
            };

            self.repair_entry(&mut entry, files, report);

            if entry.has_files() {
                kept.push(Lenient::Typed(entry));
            } else {
                tracing::warn!(index, "dropping content_scripts entry without files");
                report.dropped_entries.push(DroppedEntry {
                    index,
                    reason: DropReason::NoFiles,
                });
            }
        }

        if kept.is_empty() {
            tracing::warn!("no usable content_scripts entries; removing the key");
            report.content_scripts_removed = true;
        } else {
            manifest.content_scripts = Some(Lenient::Typed(kept));
        }
    }

    fn repair_entry(
        &self,
        entry: &mut ContentScriptEntry,
        files: &mut FileSet,
        report: &mut ValidationReport,
    ) {
        if let Some(js) = entry.js.take() {
            let kept: Vec<String> = js
                .into_iter()
                .filter(|path| {
                    self.repair_source(path, StubKind::ContentScript, files, report)
                })
                .collect();
            entry.js = (!kept.is_empty()).then_some(kept);
        }
        if let Some(css) = entry.css.take() {
            let kept: Vec<String> = css
                .into_iter()
                .filter(|path| {
                    self.repair_source(path, StubKind::ContentStyle, files, report)
                })
                .collect();
            entry.css = (!kept.is_empty()).then_some(kept);
        }
    }

    /// Ensure `raw` holds real source, writing a stub if it is missing or
    /// blank. Returns `false` if the path can never be bundled.
    fn repair_source(
        &self,
        raw: &str,
        stub: StubKind,
        files: &mut FileSet,
        report: &mut ValidationReport,
    ) -> bool {
        let path = match ArchivePath::new(raw) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(path = %raw, error = %err, "ignoring invalid content script path");
                report.warnings.push(ValidationWarning::InvalidPath {
                    path: raw.to_string(),
                    reason: err.to_string(),
                });
                return false;
            }
        };

        let reason = match files.get(path.as_str()) {
            None => RepairReason::Missing,
            Some(content) if is_blank(content) => RepairReason::Blank,
            Some(_) => return true,
        };

        tracing::info!(path = %path, ?reason, "writing default content script file");
        files.insert(path, self.stub_text(stub, ""));
        report.repairs.push(Repair {
            path: raw.to_string(),
            stub,
            reason,
        });
        true
    }

    fn check_entry_points(
        &self,
        manifest: &Manifest,
        files: &mut FileSet,
        report: &mut ValidationReport,
    ) {
        let name = manifest.display_name().unwrap_or("Extension").to_string();

        for entry_point in manifest.entry_points() {
            let path = match ArchivePath::new(&entry_point.path) {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(
                        entry = %entry_point.kind,
                        path = %entry_point.path,
                        error = %err,
                        "entry point path is not a bundle path"
                    );
                    report.warnings.push(ValidationWarning::InvalidPath {
                        path: entry_point.path.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let stub = match entry_point.kind {
                EntryPointKind::Background => StubKind::BackgroundScript,
                EntryPointKind::Popup => StubKind::PopupPage,
                EntryPointKind::SidePanel => StubKind::SidePanelPage,
            };

            let reason = match files.get(path.as_str()) {
                None => RepairReason::Missing,
                // Only scripts are checked for blank content; an empty page
                // still loads.
                Some(content) if stub == StubKind::BackgroundScript && is_blank(content) => {
                    RepairReason::Blank
                }
                Some(_) => continue,
            };

            if reason == RepairReason::Missing && self.policy == EntryPointPolicy::Warn {
                tracing::warn!(
                    entry = %entry_point.kind,
                    path = %entry_point.path,
                    "declared entry point has no file"
                );
                report.warnings.push(ValidationWarning::DanglingEntryPoint {
                    entry: entry_point.kind,
                    path: entry_point.path,
                });
                continue;
            }

            tracing::info!(entry = %entry_point.kind, path = %path, ?reason, "writing default entry point");
            files.insert(path, self.stub_text(stub, &name));
            report.repairs.push(Repair {
                path: entry_point.path,
                stub,
                reason,
            });
        }
    }

    fn stub_text(&self, stub: StubKind, name: &str) -> String {
        match stub {
            StubKind::ContentScript => self.templates.content_script.to_string(),
            StubKind::ContentStyle => self.templates.content_style.to_string(),
            StubKind::BackgroundScript => self.templates.background_script.to_string(),
            StubKind::PopupPage => self.templates.popup_page(name),
            StubKind::SidePanelPage => self.templates.side_panel_page(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn files(pairs: &[(&str, &str)]) -> FileSet {
        FileSet::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn manifest_json(outcome: &ValidationOutcome) -> Value {
        serde_json::from_str(&outcome.manifest_text).unwrap()
    }

    #[test]
    fn blank_source_detection() {
        assert!(is_blank_source(""));
        assert!(is_blank_source("  \n\t"));
        assert!(is_blank_source("// TODO: implement\n"));
        assert!(is_blank_source("/* multi\nline */\n// and more"));
        assert!(!is_blank_source("console.log(1)"));
        assert!(!is_blank_source("/* header */ run();"));
    }

    #[test]
    fn comment_only_script_replaced() {
        let validator = StructuralValidator::default();
        let set = files(&[("content.js", "// TODO: implement\n")]);
        let manifest = r#"{"content_scripts":[{"matches":["<all_urls>"],"js":["content.js"]}]}"#;

        let outcome = validator.validate(set, manifest).unwrap();

        let script = outcome.files.get_text("content.js").unwrap();
        assert!(script.contains("chrome.runtime.onMessage.addListener"));
        assert_eq!(outcome.report.repairs.len(), 1);
        assert_eq!(outcome.report.repairs[0].reason, RepairReason::Blank);
        assert_eq!(manifest_json(&outcome)["content_scripts"][0]["js"][0], "content.js");
    }

    #[test]
    fn missing_css_synthesized() {
        let validator = StructuralValidator::default();
        let manifest = r#"{"content_scripts":[{"matches":["*://*/*"],"css":["style.css"]}]}"#;

        let outcome = validator.validate(FileSet::new(), manifest).unwrap();
        assert!(outcome
            .files
            .get_text("style.css")
            .unwrap()
            .contains(".extension-highlight"));
        assert_eq!(outcome.report.repairs[0].stub, StubKind::ContentStyle);
        assert_eq!(outcome.report.repairs[0].reason, RepairReason::Missing);
    }

    #[test]
    fn real_script_kept_verbatim() {
        let validator = StructuralValidator::default();
        let set = files(&[("content.js", "document.body.dataset.x = 1;")]);
        let manifest = r#"{"content_scripts":[{"matches":["<all_urls>"],"js":["content.js"]}]}"#;

        let outcome = validator.validate(set, manifest).unwrap();
        assert_eq!(outcome.files.get_text("content.js"), Some("document.body.dataset.x = 1;"));
        assert!(outcome.report.is_clean());
    }

    #[test]
    fn only_valid_entries_survive() {
        let validator = StructuralValidator::default();
        let set = files(&[("a.js", "run();")]);
        let manifest = r#"{"content_scripts":[
            {"matches":["<all_urls>"],"js":["a.js"]},
            {"matches":["<all_urls>"]}
        ]}"#;

        let outcome = validator.validate(set, manifest).unwrap();
        let scripts = &manifest_json(&outcome)["content_scripts"];
        assert_eq!(scripts.as_array().unwrap().len(), 1);
        assert_eq!(scripts[0]["js"][0], "a.js");
        assert_eq!(
            outcome.report.dropped_entries,
            vec![DroppedEntry {
                index: 1,
                reason: DropReason::NoFiles
            }]
        );
    }

    #[test]
    fn empty_result_removes_key() {
        let validator = StructuralValidator::default();
        let manifest = r#"{"name":"x","content_scripts":[{"matches":["<all_urls>"],"js":[]}]}"#;

        let outcome = validator.validate(FileSet::new(), manifest).unwrap();
        assert!(manifest_json(&outcome).get("content_scripts").is_none());
        assert!(outcome.report.content_scripts_removed);
    }

    #[test]
    fn non_array_content_scripts_removed() {
        let validator = StructuralValidator::default();
        let outcome = validator
            .validate(FileSet::new(), r#"{"content_scripts":{"js":"a.js"}}"#)
            .unwrap();
        assert!(manifest_json(&outcome).get("content_scripts").is_none());
        assert_eq!(
            outcome.report.warnings,
            vec![ValidationWarning::ContentScriptsNotArray]
        );
    }

    #[test]
    fn malformed_entry_dropped() {
        let validator = StructuralValidator::default();
        let set = files(&[("a.js", "run();")]);
        let manifest = r#"{"content_scripts":["a.js", {"matches":["<all_urls>"],"js":["a.js"]}]}"#;

        let outcome = validator.validate(set, manifest).unwrap();
        assert_eq!(outcome.report.dropped_entries[0].reason, DropReason::Malformed);
        assert_eq!(manifest_json(&outcome)["content_scripts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn traversal_path_dropped_from_entry() {
        let validator = StructuralValidator::default();
        let manifest = r#"{"content_scripts":[{"matches":["<all_urls>"],"js":["../evil.js"]}]}"#;

        let outcome = validator.validate(FileSet::new(), manifest).unwrap();
        assert!(matches!(
            outcome.report.warnings[0],
            ValidationWarning::InvalidPath { .. }
        ));
        assert!(outcome.report.content_scripts_removed);
        assert_eq!(outcome.files.len(), 1);
    }

    #[test]
    fn missing_background_warns_under_default_policy() {
        let validator = StructuralValidator::default();
        let manifest = r#"{"background":{"service_worker":"bg.js"}}"#;

        let outcome = validator.validate(FileSet::new(), manifest).unwrap();
        assert!(!outcome.files.contains("bg.js"));
        assert_eq!(outcome.report.dangling_paths().collect::<Vec<_>>(), vec!["bg.js"]);
    }

    #[test]
    fn blank_background_always_replaced() {
        let validator = StructuralValidator::default();
        let set = files(&[("bg.js", "/* nothing */")]);
        let manifest = r#"{"background":{"service_worker":"bg.js"}}"#;

        let outcome = validator.validate(set, manifest).unwrap();
        assert!(outcome.files.get_text("bg.js").unwrap().contains("onInstalled"));
        assert_eq!(outcome.report.repairs[0].reason, RepairReason::Blank);
    }

    #[test]
    fn stub_policy_synthesizes_pages() {
        let validator = StructuralValidator::new(EntryPointPolicy::Stub);
        let manifest = r#"{
            "name": "Reader",
            "action": {"default_popup": "popup.html"},
            "side_panel": {"default_path": "panel.html"},
            "background": {"service_worker": "bg.js"}
        }"#;

        let outcome = validator.validate(FileSet::new(), manifest).unwrap();
        assert!(outcome.files.get_text("popup.html").unwrap().contains("<h1>Reader</h1>"));
        assert!(outcome.files.contains("panel.html"));
        assert!(outcome.files.contains("bg.js"));
        assert_eq!(outcome.report.repairs.len(), 3);
        assert_eq!(outcome.report.dangling_paths().count(), 0);
    }

    #[test]
    fn validation_is_idempotent() {
        let validator = StructuralValidator::default();
        let set = files(&[("content.js", "")]);
        let manifest = r#"{
            "name": "Demo",
            "content_scripts": [
                {"matches": ["<all_urls>"], "js": ["content.js"], "css": ["c.css"]},
                {"matches": ["<all_urls>"]}
            ],
            "action": {"default_popup": "popup.html"}
        }"#;

        let first = validator.validate(set, manifest).unwrap();
        let second = validator
            .validate(first.files.clone(), &first.manifest_text)
            .unwrap();

        assert_eq!(second.files, first.files);
        assert_eq!(second.manifest_text, first.manifest_text);
        assert!(second.report.repairs.is_empty());
        assert!(second.report.dropped_entries.is_empty());
    }

    #[test]
    fn manifest_written_into_file_set() {
        let validator = StructuralValidator::default();
        let outcome = validator
            .validate(files(&[(MANIFEST_PATH, "{}")]), r#"{"name":"n","extra":1}"#)
            .unwrap();
        assert_eq!(
            outcome.files.get_text(MANIFEST_PATH),
            Some(outcome.manifest_text.as_str())
        );
    }

    #[test]
    fn validate_files_requires_manifest() {
        let validator = StructuralValidator::default();
        assert!(matches!(
            validator.validate_files(FileSet::new()),
            Err(ValidationError::ManifestMissing)
        ));
    }

    #[test]
    fn unparsable_manifest_is_error() {
        let validator = StructuralValidator::default();
        assert!(matches!(
            validator.validate(FileSet::new(), "not json"),
            Err(ValidationError::Manifest(_))
        ));
    }

    #[test]
    fn repeated_validation_gives_equal_outcomes() {
        let input = files(&[("manifest.json", r#"{"name": "Same", "icons": {"16": "icons/a.png"}}"#)]);
        let validator = StructuralValidator::default();
        let first = validator.validate_files(input.clone()).unwrap();
        let second = validator.validate_files(input).unwrap();
        assert_eq!(first, second);
    }
}
