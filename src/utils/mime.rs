//! Upload content type detection.

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolve the content type of an upload.
///
/// A declared type wins unless it is missing or generic. Otherwise the bytes
/// are sniffed, then the filename extension is consulted, and finally valid
/// UTF-8 is treated as plain text.
pub fn detect_mime(bytes: &[u8], filename: Option<&str>, declared: Option<&str>) -> String {
    declared
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty() && d != OCTET_STREAM)
        .or_else(|| infer::get(bytes).map(|t| t.mime_type().to_string()))
        .or_else(|| {
            filename
                .and_then(|name| mime_guess::from_path(Path::new(name)).first_raw())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if !bytes.is_empty() && std::str::from_utf8(bytes).is_ok() {
                "text/plain".to_string()
            } else {
                OCTET_STREAM.to_string()
            }
        })
}
