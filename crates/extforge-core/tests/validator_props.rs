//! Validator scenarios and invariants

use extforge_artifact::{FileSet, MANIFEST_PATH};
use extforge_core::{EntryPointPolicy, StructuralValidator};
use extforge_test_utils::file_set;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

#[test]
fn comment_only_content_script_is_replaced_and_kept() {
    let files = file_set(&[("content.js", "// TODO: implement\n")]);
    let manifest = r#"{"name": "A", "content_scripts": [{"matches": ["<all_urls>"], "js": ["content.js"]}]}"#;

    let outcome = StructuralValidator::default().validate(files, manifest).unwrap();

    let script = outcome.files.get_text("content.js").unwrap();
    assert!(script.contains("chrome.runtime.onMessage.addListener"));
    let shipped: Value = serde_json::from_str(&outcome.manifest_text).unwrap();
    assert_eq!(
        shipped["content_scripts"],
        json!([{"matches": ["<all_urls>"], "js": ["content.js"]}])
    );
}

#[test]
fn only_valid_content_script_entry_survives() {
    let files = file_set(&[("a.js", "start();")]);
    let manifest = r#"{"content_scripts": [
        {"matches": ["<all_urls>"], "js": ["a.js"]},
        {"matches": ["<all_urls>"]}
    ]}"#;

    let outcome = StructuralValidator::default().validate(files, manifest).unwrap();
    let shipped: Value = serde_json::from_str(&outcome.manifest_text).unwrap();
    assert_eq!(
        shipped["content_scripts"],
        json!([{"matches": ["<all_urls>"], "js": ["a.js"]}])
    );
}

#[test]
fn unknown_keys_keep_their_order() {
    let manifest = r#"{"zeta": 1, "name": "Order", "alpha": {"b": 1, "a": 2}}"#;
    let outcome = StructuralValidator::default()
        .validate(FileSet::new(), manifest)
        .unwrap();
    assert_eq!(
        outcome.manifest_text,
        "{\n  \"name\": \"Order\",\n  \"zeta\": 1,\n  \"alpha\": {\n    \"b\": 1,\n    \"a\": 2\n  }\n}"
    );
}

fn source_content() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some("")),
        Just(Some("// nothing yet")),
        Just(Some("/* a */\n/* b */")),
        Just(Some("main();")),
        Just(Some(".x { color: red; }")),
    ]
}

fn path_list() -> impl Strategy<Value = Option<Vec<&'static str>>> {
    proptest::option::of(proptest::collection::vec(
        prop_oneof![
            Just("a.js"),
            Just("b.js"),
            Just("s/c.css"),
            Just("./d.css"),
            Just("../bad.js"),
        ],
        0..3,
    ))
}

fn entry() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => (path_list(), path_list()).prop_map(|(js, css)| {
            let mut entry = json!({"matches": ["<all_urls>"]});
            if let Some(js) = js {
                entry["js"] = json!(js);
            }
            if let Some(css) = css {
                entry["css"] = json!(css);
            }
            entry
        }),
        1 => Just(json!("not-an-object")),
        1 => Just(json!({"js": "a.js"})),
    ]
}

fn project() -> impl Strategy<Value = (FileSet, String)> {
    (
        proptest::collection::vec(source_content(), 4),
        proptest::option::of(proptest::collection::vec(entry(), 0..4)),
        any::<bool>(),
    )
        .prop_map(|(contents, entries, with_background)| {
            let mut files = FileSet::new();
            for (path, content) in ["a.js", "b.js", "s/c.css", "d.css"].iter().zip(contents) {
                if let Some(content) = content {
                    files.insert_text(path, content).unwrap();
                }
            }
            let mut manifest = json!({"manifest_version": 3, "name": "Prop"});
            if let Some(entries) = entries {
                manifest["content_scripts"] = Value::Array(entries);
            }
            if with_background {
                manifest["background"] = json!({"service_worker": "a.js"});
            }
            (files, manifest.to_string())
        })
}

proptest! {
    #[test]
    fn validation_is_idempotent((files, manifest) in project(), stub in any::<bool>()) {
        let policy = if stub { EntryPointPolicy::Stub } else { EntryPointPolicy::Warn };
        let validator = StructuralValidator::new(policy);

        let first = validator.validate(files, &manifest).unwrap();
        let second = validator.validate_files(first.files.clone()).unwrap();

        prop_assert_eq!(&second.files, &first.files);
        prop_assert_eq!(&second.manifest_text, &first.manifest_text);
        prop_assert!(second.report.repairs.is_empty());
        prop_assert!(second.report.dropped_entries.is_empty());
    }

    #[test]
    fn surviving_entries_inject_files((files, manifest) in project()) {
        let outcome = StructuralValidator::default().validate(files, &manifest).unwrap();
        let shipped: Value = serde_json::from_str(&outcome.manifest_text).unwrap();

        match shipped.get("content_scripts") {
            None => {}
            Some(Value::Array(entries)) => {
                prop_assert!(!entries.is_empty());
                for entry in entries {
                    let count = |key: &str| entry.get(key).and_then(Value::as_array).map_or(0, Vec::len);
                    prop_assert!(count("js") + count("css") > 0);
                }
            }
            Some(other) => prop_assert!(false, "content_scripts is {}", other),
        }
        prop_assert_eq!(
            outcome.files.get_text(MANIFEST_PATH),
            Some(outcome.manifest_text.as_str())
        );
    }
}
