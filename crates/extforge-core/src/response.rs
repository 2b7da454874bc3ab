//! HTTP-shaped export responses
//!
//! Transport-agnostic: a status, headers and a body that any HTTP layer can
//! copy onto its own response type.

use crate::error::ExportError;
use crate::pipeline::ExportedArchive;

/// Status, headers and body for one export call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ExportResponse {
    /// Map an export outcome onto the download contract
    ///
    /// Success is `200` with the archive as body; every failure is a JSON
    /// `{error, missing?, path?}` body and never includes archive bytes.
    #[must_use]
    pub fn from_result(result: Result<ExportedArchive, ExportError>) -> Self {
        match result {
            Ok(exported) => Self::archive(exported),
            Err(err) => Self::error(&err),
        }
    }

    fn archive(exported: ExportedArchive) -> Self {
        let archive = exported.archive;
        let headers = vec![
            ("Content-Type".to_string(), "application/zip".to_string()),
            (
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{}\"", archive.file_name),
            ),
            ("Content-Length".to_string(), archive.bytes.len().to_string()),
        ];
        Self {
            status: 200,
            headers,
            body: archive.bytes,
        }
    }

    fn error(err: &ExportError) -> Self {
        let body = serde_json::to_vec(&err.body()).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status: err.status_code(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    /// First header named `name`, case-insensitive
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the body is an archive
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}
