//! Text encoding detection for source files.

use encoding_rs::{Encoding, UTF_8};

/// Look up an encoding by WHATWG label (`utf-8`, `ISO-8859-1`, `latin1`, ...).
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Decode source bytes.
///
/// A byte order mark wins over the configured encoding. Without one, a
/// UTF-8 configuration decodes strictly. A legacy configuration still reads
/// the file as UTF-8 when the bytes are valid UTF-8 and contain non-ASCII
/// text, since a legacy single-byte decode would garble it.
///
/// Returns `None` when the bytes are malformed for the chosen encoding.
pub fn decode(bytes: &[u8], configured: &'static Encoding) -> Option<(String, &'static Encoding)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_strict(&bytes[bom_len..], encoding).map(|text| (text, encoding));
    }
    if configured == UTF_8 {
        return decode_strict(bytes, UTF_8).map(|text| (text, UTF_8));
    }
    if !bytes.is_ascii()
        && let Ok(text) = std::str::from_utf8(bytes)
    {
        tracing::debug!(
            configured = configured.name(),
            "source bytes are valid UTF-8, decoding as UTF-8"
        );
        return Some((text.to_string(), UTF_8));
    }
    decode_strict(bytes, configured).map(|text| (text, configured))
}

fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}
