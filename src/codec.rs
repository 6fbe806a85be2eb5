//! Image payload codec: binary bytes ⇔ transportable data-URL string.
//!
//! Encoded payloads are self-describing (`data:<mime>;base64,<payload>`),
//! safe to persist, and sufficient to reconstruct a binary handle when an
//! image loaded from the store is re-submitted to inference.

use base64::Engine as _;

use crate::models::ImageBinary;

/// Failure to reconstruct a binary handle from a persisted payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload does not start with a data: scheme")]
    MissingScheme,
    #[error("payload has no \";base64,\" marker")]
    MissingBase64Marker,
    #[error("payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Encode raw image bytes as a data URL. Infallible by construction.
pub fn encode(binary: &ImageBinary) -> String {
    format!(
        "data:{};base64,{}",
        binary.mime_type,
        base64::engine::general_purpose::STANDARD.encode(&binary.bytes)
    )
}

/// Reconstruct a binary handle from a previously encoded payload.
///
/// `name` is carried onto the handle so inference logs stay attributable;
/// it is not part of the encoded form.
pub fn decode(payload: &str, name: &str) -> Result<ImageBinary, DecodeError> {
    let rest = payload
        .strip_prefix("data:")
        .ok_or(DecodeError::MissingScheme)?;
    let (mime_type, data) = rest
        .split_once(";base64,")
        .ok_or(DecodeError::MissingBase64Marker)?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
    Ok(ImageBinary {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        bytes,
    })
}
