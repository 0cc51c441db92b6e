//! MIME type detection module
//!
//! Returns the Content-Type for a served file: by extension first, then by a
//! look at the content when the extension is unknown.

use mime_guess::mime;
use std::path::Path;

const OCTET_STREAM: &str = "application/octet-stream";
const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Bytes inspected when sniffing content without a known extension
const SNIFF_LEN: usize = 512;

/// Get the Content-Type for a file
///
/// # Examples
/// ```
/// use std::path::Path;
/// use assetd::http::mime::content_type_for;
/// assert_eq!(content_type_for(Path::new("index.html"), b""), "text/html; charset=utf-8");
/// assert_eq!(content_type_for(Path::new("logo.png"), b""), "image/png");
/// assert_eq!(content_type_for(Path::new("notes"), b"plain words"), "text/plain; charset=utf-8");
/// ```
pub fn content_type_for(path: &Path, content: &[u8]) -> String {
    match mime_guess::from_path(path).first() {
        Some(guess) if guess.type_() == mime::TEXT && guess.get_param(mime::CHARSET).is_none() => {
            format!("{guess}; charset=utf-8")
        }
        Some(guess) => guess.to_string(),
        None => sniff(content).to_string(),
    }
}

/// Minimal content sniffing: UTF-8 without control bytes is plain text
fn sniff(content: &[u8]) -> &'static str {
    let head = &content[..content.len().min(SNIFF_LEN)];
    let text = match std::str::from_utf8(head) {
        Ok(s) => s,
        // A multi-byte character may be cut at the sniff boundary
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return OCTET_STREAM,
    };
    if text.is_empty() || text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        OCTET_STREAM
    } else {
        PLAIN_TEXT
    }
}
