// ABOUTME: Response body decoding from the declared text encoding
// ABOUTME: UTF-8 passes through; legacy labels go through encoding_rs without replacement

use encoding_rs::Encoding;

use super::error::{ExtractError, Result};

pub fn is_utf8_label(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8")
}

/// Decode raw body bytes. Unknown labels and malformed input are errors.
pub fn decode_body(bytes: &[u8], encoding: &str) -> Result<String> {
    if is_utf8_label(encoding) {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let label = encoding.trim();
    let codec = Encoding::for_label(label.as_bytes()).ok_or_else(|| ExtractError::Decode {
        encoding: label.to_string(),
        message: "unknown encoding label".to_string(),
    })?;

    codec
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| ExtractError::Decode {
            encoding: codec.name().to_string(),
            message: "malformed byte sequence".to_string(),
        })
}
