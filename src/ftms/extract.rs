use super::schema::FileType;

/// Default upper bound on the response size scanned for markers and heuristics (1 MiB).
pub const DEFAULT_MAX_SCAN_BYTES: usize = 1_048_576;

/// Whether a response is small enough to be scanned at all.
/// Oversized responses pass through untouched instead of being partially scanned,
/// so a marker straddling the cut can never swallow the rest of the text.
pub fn within_scan_limit(text: &str, max_scan_bytes: usize) -> bool {
    max_scan_bytes == 0 || text.len() <= max_scan_bytes
}

/// Whitespace-delimited token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn line_count(text: &str) -> usize {
    text.lines().count()
}

/// MIME type served for a stored candidate.
pub fn mime_for(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Md => "text/markdown",
        FileType::Txt => "text/plain",
        FileType::Doc => "application/msword",
    }
}
