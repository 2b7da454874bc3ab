//! Typed extension manifest
//!
//! Only the keys the packaging pipeline reads or repairs are modelled. Every
//! other key is carried through untouched in `extra`, in its original order.

use crate::error::{ManifestError, ManifestResult};
use crate::lenient::Lenient;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Icon size → path mapping (`{"16": "icons/icon16.png"}`)
pub type IconMap = IndexMap<String, String>;

/// Parsed `manifest.json`
///
/// Serialization order is fixed: the modelled keys below in declaration
/// order, then every unknown key in the order it was read. Parsing the
/// output again therefore reproduces it byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_version: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<Lenient<IconMap>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Lenient<Action>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Lenient<Background>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_panel: Option<Lenient<SidePanel>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_scripts: Option<Lenient<Vec<Lenient<ContentScriptEntry>>>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// `action` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_popup: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_icon: Option<Lenient<IconMap>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Action {
    /// Rebuild an action from an object whose known keys had the wrong
    /// shape. Unusable known values move into `extra` so nothing is lost.
    #[must_use]
    pub fn from_loose_object(object: serde_json::Map<String, Value>) -> Self {
        let mut extra: IndexMap<String, Value> = object.into_iter().collect();

        let default_popup = match extra.shift_remove("default_popup") {
            Some(Value::String(path)) => Some(path),
            Some(other) => {
                extra.insert("default_popup".to_string(), other);
                None
            }
            None => None,
        };
        let default_icon = extra.shift_remove("default_icon").map(|value| {
            serde_json::from_value::<IconMap>(value.clone())
                .map_or(Lenient::Raw(value), Lenient::Typed)
        });

        Self {
            default_popup,
            default_icon,
            extra,
        }
    }
}

/// `background` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Background {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_worker: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// `side_panel` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidePanel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// One `content_scripts` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentScriptEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub js: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ContentScriptEntry {
    /// Declared script paths
    #[inline]
    #[must_use]
    pub fn js_paths(&self) -> &[String] {
        self.js.as_deref().unwrap_or_default()
    }

    /// Declared stylesheet paths
    #[inline]
    #[must_use]
    pub fn css_paths(&self) -> &[String] {
        self.css.as_deref().unwrap_or_default()
    }

    /// An entry is worth keeping only if it injects at least one file
    #[inline]
    #[must_use]
    pub fn has_files(&self) -> bool {
        !self.js_paths().is_empty() || !self.css_paths().is_empty()
    }
}

/// Page or worker the browser loads directly from the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPointKind {
    /// `background.service_worker`
    Background,
    /// `action.default_popup`
    Popup,
    /// `side_panel.default_path`
    SidePanel,
}

impl EntryPointKind {
    /// Manifest key that declares this entry point
    #[must_use]
    pub fn manifest_key(self) -> &'static str {
        match self {
            Self::Background => "background.service_worker",
            Self::Popup => "action.default_popup",
            Self::SidePanel => "side_panel.default_path",
        }
    }
}

impl Display for EntryPointKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_key())
    }
}

/// A declared entry point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPoint {
    pub kind: EntryPointKind,
    pub path: String,
}

impl Manifest {
    /// Parse manifest text
    ///
    /// # Errors
    /// - [`ManifestError::Parse`] if the text is not JSON
    /// - [`ManifestError::NotAnObject`] if the root is not an object
    pub fn parse(text: &str) -> ManifestResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| ManifestError::parse(&e))?;
        Self::from_value(value)
    }

    /// Build from an already-parsed JSON value
    ///
    /// # Errors
    /// Returns [`ManifestError::NotAnObject`] if `value` is not an object.
    pub fn from_value(value: Value) -> ManifestResult<Self> {
        let found = json_kind(&value);
        if found != "object" {
            return Err(ManifestError::NotAnObject { found });
        }
        serde_json::from_value(value).map_err(|e| ManifestError::parse(&e))
    }

    /// Serialize with 2-space indentation
    ///
    /// # Errors
    /// Returns [`ManifestError::Serialize`] if serialization fails.
    pub fn to_pretty_json(&self) -> ManifestResult<String> {
        serde_json::to_string_pretty(self).map_err(ManifestError::Serialize)
    }

    /// Extension name, if it is a plain string
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    /// `background.service_worker`
    #[must_use]
    pub fn background_worker(&self) -> Option<&str> {
        self.background
            .as_ref()
            .and_then(Lenient::typed)
            .and_then(|bg| bg.service_worker.as_deref())
    }

    /// `action.default_popup`
    #[must_use]
    pub fn popup_page(&self) -> Option<&str> {
        self.action
            .as_ref()
            .and_then(Lenient::typed)
            .and_then(|action| action.default_popup.as_deref())
    }

    /// `side_panel.default_path`
    #[must_use]
    pub fn side_panel_page(&self) -> Option<&str> {
        self.side_panel
            .as_ref()
            .and_then(Lenient::typed)
            .and_then(|panel| panel.default_path.as_deref())
    }

    /// Declared entry points, in a fixed order
    #[must_use]
    pub fn entry_points(&self) -> Vec<EntryPoint> {
        [
            (EntryPointKind::Background, self.background_worker()),
            (EntryPointKind::Popup, self.popup_page()),
            (EntryPointKind::SidePanel, self.side_panel_page()),
        ]
        .into_iter()
        .filter_map(|(kind, path)| {
            path.filter(|p| !p.is_empty()).map(|p| EntryPoint {
                kind,
                path: p.to_string(),
            })
        })
        .collect()
    }

    /// Well-formed content script entries
    pub fn content_script_entries(&self) -> impl Iterator<Item = &ContentScriptEntry> {
        self.content_scripts
            .as_ref()
            .and_then(Lenient::typed)
            .into_iter()
            .flatten()
            .filter_map(Lenient::typed)
    }

    /// Every `js` and `css` path declared by well-formed entries
    #[must_use]
    pub fn content_script_files(&self) -> Vec<&str> {
        self.content_script_entries()
            .flat_map(|entry| entry.js_paths().iter().chain(entry.css_paths()))
            .map(String::as_str)
            .collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
