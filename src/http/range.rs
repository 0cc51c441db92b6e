//! HTTP Range request parsing module
//!
//! Single byte-range support (RFC 9110 section 14) for partial downloads.

/// A satisfiable byte range, both ends inclusive and within the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    /// Number of bytes covered
    pub const fn content_length(&self) -> usize {
        self.end - self.start + 1
    }

    /// `Content-Range` value for this range of a file of `total` bytes
    pub fn content_range(&self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Serve this slice with 206 Partial Content
    Satisfiable(ByteRange),
    /// No byte of the file is covered - respond 416
    Unsatisfiable,
    /// No Range header, another unit, multiple ranges or malformed: serve the whole file
    Ignored,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end` - Specific range, end clamped to the file
/// - `bytes=start-` - From start to end of file
/// - `bytes=-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use assetd::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert_eq!(result, RangeParseResult::Satisfiable(ByteRange { start: 0, end: 99 }));
///
/// let result = parse_range_header(None, 1000);
/// assert_eq!(result, RangeParseResult::Ignored);
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::Ignored;
    };

    // Multi-range responses (multipart/byteranges) are not produced
    if spec.contains(',') {
        return RangeParseResult::Ignored;
    }

    let Some((first, last)) = spec.split_once('-') else {
        return RangeParseResult::Ignored;
    };
    let (first, last) = (first.trim(), last.trim());

    if file_size == 0 {
        return RangeParseResult::Unsatisfiable;
    }

    if first.is_empty() {
        return suffix_range(last, file_size);
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeParseResult::Ignored;
    };

    let end = if last.is_empty() {
        file_size - 1
    } else {
        match last.parse::<usize>() {
            Ok(end) if end < start => return RangeParseResult::Ignored,
            Ok(end) => end.min(file_size - 1),
            Err(_) => return RangeParseResult::Ignored,
        }
    };

    if start >= file_size {
        return RangeParseResult::Unsatisfiable;
    }

    RangeParseResult::Satisfiable(ByteRange { start, end })
}

/// Parse suffix range (e.g., "-500"); a suffix longer than the file covers all of it
fn suffix_range(suffix: &str, file_size: usize) -> RangeParseResult {
    match suffix.parse::<usize>() {
        Ok(0) => RangeParseResult::Unsatisfiable,
        Ok(n) => RangeParseResult::Satisfiable(ByteRange {
            start: file_size.saturating_sub(n),
            end: file_size - 1,
        }),
        Err(_) => RangeParseResult::Ignored,
    }
}
