//! Lenient base64 decoding of stored payloads

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, GeneralPurpose};
use base64::Engine as _;

/// Standard alphabet; padding optional, trailing bits ignored
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Why a payload could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeFailure {
    /// Not base64
    #[error("invalid base64: {0}")]
    Invalid(String),
    /// Decoded to zero bytes
    #[error("payload is empty")]
    Empty,
}

/// Decode a stored base64 payload
///
/// Accepts `data:<mime>;base64,` prefixes, embedded whitespace and missing
/// padding, since uploads arrive from browsers and import scripts alike.
///
/// # Errors
/// Returns [`DecodeFailure`] if the text is not base64 or decodes to nothing.
pub fn decode_payload(raw: &str) -> Result<Vec<u8>, DecodeFailure> {
    let payload = strip_data_url(raw.trim());
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = LENIENT
        .decode(compact.as_bytes())
        .map_err(|err| DecodeFailure::Invalid(err.to_string()))?;
    if bytes.is_empty() {
        return Err(DecodeFailure::Empty);
    }
    Ok(bytes)
}

fn strip_data_url(raw: &str) -> &str {
    if raw.starts_with("data:") {
        if let Some((_, payload)) = raw.split_once(";base64,") {
            return payload;
        }
    }
    raw
}
