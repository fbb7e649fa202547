//! Content-type sniffing from the leading bytes of a stream.

/// Number of leading bytes that take part in sniffing.
pub const SNIFF_LEN: usize = 512;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Infer a MIME type from at most the first [`SNIFF_LEN`] bytes of `data`.
///
/// Magic numbers are matched first (images, archives, documents, media).
/// Content without a known signature is reported as UTF-8 text when it
/// contains no binary control bytes, and as `application/octet-stream`
/// otherwise.
pub fn sniff_content_type(data: &[u8]) -> String {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    match data {
        [0xFE, 0xFF, ..] => return "text/plain; charset=utf-16be".to_string(),
        [0xFF, 0xFE, ..] => return "text/plain; charset=utf-16le".to_string(),
        [0xEF, 0xBB, 0xBF, ..] => return TEXT_PLAIN_UTF8.to_string(),
        _ => {}
    }

    if data.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM.to_string()
    } else {
        TEXT_PLAIN_UTF8.to_string()
    }
}

// Control bytes that never show up in text.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
