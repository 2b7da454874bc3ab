//! Shape-tolerant manifest fields
//!
//! Generated manifests regularly put the wrong JSON shape under a known key
//! (`"icons": "icon.png"`, `"content_scripts": {}`). [`Lenient<T>`] parses the
//! expected shape when it can and otherwise keeps the raw value, so parsing
//! never fails on shape and normalization decides what to do with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A field that is either the expected typed shape or the raw JSON found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    /// Value had the expected shape
    Typed(T),
    /// Anything else, kept verbatim
    Raw(Value),
}

impl<T> Lenient<T> {
    /// Typed view
    #[inline]
    #[must_use]
    pub fn typed(&self) -> Option<&T> {
        match self {
            Self::Typed(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Mutable typed view
    #[inline]
    pub fn typed_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Typed(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Whether the value had an unexpected shape
    #[inline]
    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl<T: Default> Lenient<T> {
    /// Coerce to the typed shape, replacing raw values with `T::default()`
    pub fn coerce(&mut self) -> &mut T {
        if let Self::Raw(_) = self {
            *self = Self::Typed(T::default());
        }
        match self {
            Self::Typed(value) => value,
            Self::Raw(_) => unreachable!("raw variant replaced above"),
        }
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Self::Typed(value)
    }
}
