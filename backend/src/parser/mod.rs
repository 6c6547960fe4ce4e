//! Upload sniffing: encoding and delimiter detection.
//!
//! The transcoder expects UTF-8. Uploads coming from spreadsheet exports are
//! often Latin-1 or Windows-1252, so the transport layer runs them through
//! [`sniff`] first and hands the re-encoded text to the converter.

use std::borrow::Cow;

/// Delimiters considered by [`detect_delimiter`], in tie-break order.
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Result of sniffing an uploaded file
#[derive(Debug, Clone)]
pub struct SniffedInput<'a> {
    /// Content re-encoded as UTF-8
    pub content: Cow<'a, str>,
    /// Detected encoding label
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: u8,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        label if encoding_rs::Encoding::for_label(label.as_bytes()).is_some() => label.to_string(),
        // Spreadsheet exports are the usual source of non-UTF-8 uploads
        _ => "windows-1252".to_string(),
    }
}

/// Decode bytes to UTF-8 text using the given encoding label.
///
/// Unknown labels fall back to lossy UTF-8.
pub fn decode_content<'a>(bytes: &'a [u8], encoding: &str) -> Cow<'a, str> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes),
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0,
        "iso-8859-15" => encoding_rs::ISO_8859_15.decode(bytes).0,
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0,
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0,
            None => String::from_utf8_lossy(bytes),
        },
    }
}

/// Pick the most frequent candidate delimiter on the first line.
///
/// Falls back to a comma when none occurs; ties go to the earlier candidate.
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = b',';
    let mut best_count = 0;

    for &sep in &CANDIDATE_DELIMITERS {
        let count = first_line.bytes().filter(|&b| b == sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }

    best
}

/// Detect encoding, decode and detect the delimiter in one pass.
pub fn sniff(bytes: &[u8]) -> SniffedInput<'_> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    SniffedInput {
        content,
        encoding,
        delimiter,
    }
}

/// Printable form of a delimiter byte
pub fn format_delimiter(d: u8) -> String {
    match d {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
