//! Canonical icon default-fill
//!
//! Browsers expect 16, 48 and 128 px icons. Before icon resolution the
//! manifest's `icons` and `action.default_icon` maps are normalized to plain
//! objects and any missing canonical size is pointed at the shared default.

use crate::lenient::Lenient;
use crate::manifest::{Action, IconMap, Manifest};
use serde_json::Value;

/// Canonical `(size, path)` defaults
pub const CANONICAL_ICONS: [(&str, &str); 3] = [
    ("16", "icons/icon16.png"),
    ("48", "icons/icon48.png"),
    ("128", "icons/icon128.png"),
];

/// What a default-fill changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconFill {
    /// `icons` was missing or not a plain object and was reset
    pub icons_reset: bool,
    /// Sizes added to `icons`
    pub icons_added: Vec<String>,
    /// `action.default_icon` was missing or not a plain object and was reset
    pub action_reset: bool,
    /// Sizes added to `action.default_icon`
    pub action_added: Vec<String>,
}

impl IconFill {
    /// Whether the manifest was modified
    #[must_use]
    pub fn changed(&self) -> bool {
        self.icons_reset
            || self.action_reset
            || !self.icons_added.is_empty()
            || !self.action_added.is_empty()
    }
}

/// Add every missing canonical size to `map`; an empty path counts as
/// missing. Returns the sizes that were added.
pub fn fill_canonical(map: &mut IconMap) -> Vec<String> {
    let mut added = Vec::new();
    for (size, path) in CANONICAL_ICONS {
        let missing = map.get(size).map_or(true, String::is_empty);
        if missing {
            map.insert(size.to_string(), path.to_string());
            added.push(size.to_string());
        }
    }
    added
}

fn normalized(slot: &mut Option<Lenient<IconMap>>) -> (bool, &mut IconMap) {
    let reset = !matches!(slot, Some(Lenient::Typed(_)));
    let map = slot
        .get_or_insert_with(|| Lenient::Typed(IconMap::new()))
        .coerce();
    (reset, map)
}

impl Manifest {
    /// Normalize icon maps and fill canonical sizes
    ///
    /// - `icons` that is missing or not a string→string object becomes `{}`
    /// - `action.default_icon` gets the same treatment when `action` is an
    ///   object; a non-object `action` is left alone
    pub fn fill_default_icons(&mut self) -> IconFill {
        let mut fill = IconFill::default();

        let (reset, icons) = normalized(&mut self.icons);
        fill.icons_reset = reset;
        fill.icons_added = fill_canonical(icons);

        if let Some(action) = self.action.as_mut() {
            if let Lenient::Raw(Value::Object(object)) = action {
                *action = Lenient::Typed(Action::from_loose_object(std::mem::take(object)));
            }
            if let Some(action) = action.typed_mut() {
                let (reset, default_icon) = normalized(&mut action.default_icon);
                fill.action_reset = reset;
                fill.action_added = fill_canonical(default_icon);
            }
        }

        fill
    }

    /// Non-empty paths from `icons` and `action.default_icon`
    #[must_use]
    pub fn declared_icon_paths(&self) -> Vec<&str> {
        let icons = self.icons.as_ref().and_then(Lenient::typed);
        let action_icons = self
            .action
            .as_ref()
            .and_then(Lenient::typed)
            .and_then(|action| action.default_icon.as_ref())
            .and_then(Lenient::typed);

        icons
            .into_iter()
            .chain(action_icons)
            .flat_map(IconMap::values)
            .map(String::as_str)
            .filter(|path| !path.is_empty())
            .collect()
    }
}
