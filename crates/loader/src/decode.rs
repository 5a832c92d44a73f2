//! Plain-text decoding.

use std::borrow::Cow;

/// Decode text file bytes: UTF-8 (BOM stripped), falling back to GBK.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => {
            log::warn!("Text is not valid UTF-8 ({}), decoding as GBK", e);
            let (text, had_errors): (Cow<str>, bool) =
                encoding_rs::GBK.decode_without_bom_handling(bytes);
            if had_errors {
                log::warn!("GBK decoding replaced undecodable bytes");
            }
            text.into_owned()
        }
    }
}
