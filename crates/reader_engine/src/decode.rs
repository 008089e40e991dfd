//! Byte-to-text decoding for saved pages.

use std::sync::OnceLock;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use regex_lite::Regex;
use thiserror::Error;

/// How far into the file a `<meta charset>` declaration is looked for.
const META_SCAN_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("page is not valid {encoding}")]
pub struct DecodeError {
    pub encoding: &'static str,
}

fn meta_charset() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_\-:.]+)"#).ok())
        .as_ref()
}

/// Byte order mark, then a `<meta>` charset near the top, then detection.
pub fn decode_page(bytes: &[u8]) -> Result<DecodedPage, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }
    if let Some(encoding) = declared_encoding(bytes) {
        return decode_with(bytes, encoding);
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SCAN_BYTES)];
    let head = String::from_utf8_lossy(head);
    let label = meta_charset()?.captures(&head)?.get(1)?.as_str().to_string();
    Encoding::for_label(label.as_bytes())
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedPage, DecodeError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError {
            encoding: encoding.name(),
        });
    }
    Ok(DecodedPage {
        html: text.into_owned(),
        encoding: encoding.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_wins() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<p>héllo</p>".as_bytes());
        let page = decode_page(&bytes).unwrap();
        assert_eq!(page.encoding, "UTF-8");
        assert_eq!(page.html, "<p>héllo</p>");
    }

    #[test]
    fn meta_charset_is_honoured() {
        let mut bytes = b"<html><head><meta charset=\"windows-1252\"></head><body>caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</body></html>");
        let page = decode_page(&bytes).unwrap();
        assert_eq!(page.encoding, "windows-1252");
        assert!(page.html.contains("café"));
    }

    #[test]
    fn plain_utf8_is_detected() {
        let page = decode_page("<p>阅读模式</p>".as_bytes()).unwrap();
        assert_eq!(page.html, "<p>阅读模式</p>");
    }
}
