//! Error types for manifest handling

/// Errors raised while reading or writing `manifest.json`
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Text is not valid JSON
    #[error("invalid manifest.json at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Valid JSON, but the root is not an object
    #[error("manifest.json root must be an object, found {found}")]
    NotAnObject { found: &'static str },

    /// Re-serialization failed
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl ManifestError {
    /// Build a parse error from a serde_json error
    #[must_use]
    pub fn parse(err: &serde_json::Error) -> Self {
        Self::Parse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for manifest operations
pub type ManifestResult<T> = Result<T, ManifestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_position() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let manifest_err = ManifestError::parse(&err);
        assert!(matches!(manifest_err, ManifestError::Parse { line: 2, .. }));
        assert!(manifest_err.to_string().starts_with("invalid manifest.json"));
    }

    #[test]
    fn not_an_object_display() {
        let err = ManifestError::NotAnObject { found: "array" };
        assert_eq!(
            err.to_string(),
            "manifest.json root must be an object, found array"
        );
    }
}
