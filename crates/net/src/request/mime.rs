//! MIME detection by magic-number sniffing
//!
//! Used for multipart file parts that do not declare a content type. Only the
//! leading bytes are inspected; anything unrecognized falls back to
//! `application/octet-stream`.

/// Number of leading bytes considered during sniffing
const SNIFF_WINDOW: usize = 10;

/// Fallback when no signature matches
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Known file signatures, longest-prefix entries first where prefixes overlap
const SIGNATURES: &[(&[u8], &str)] = &[
    // Images
    (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A], "image/png"),
    (&[0xFF, 0xD8, 0xFF], "image/jpeg"),
    (b"GIF8", "image/gif"),
    // Audio
    (b"ID3", "audio/mpeg"),
    (&[0xFF, 0xFB], "audio/mpeg"),
    // Video
    (&[0x00, 0x00, 0x01, 0xB3], "video/mpeg"),
    // Application
    (b"%PDF", "application/pdf"),
    (b"{\\rtf", "application/rtf"),
    // Text
    (b"<?xml ", "text/xml"),
];

/// Detect a MIME type from the leading bytes of `data`.
pub fn sniff(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(SNIFF_WINDOW)];
    SIGNATURES
        .iter()
        .find(|(signature, _)| head.starts_with(signature))
        .map_or(OCTET_STREAM, |(_, mime)| mime)
}
