use crate::fetcher::types::{Charset, StaticPage};
use bytes::Bytes;
use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

// Only the head of the document is scanned for <meta> charset hints.
const META_SCAN_BYTES: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

/// Decodes a downloaded body into UTF-8 HTML. Malformed sequences become
/// U+FFFD instead of failing the page.
pub fn decode_body(url_final: Url, body_bytes: &Bytes, content_type: &str) -> StaticPage {
    let charset = detect_charset(content_type, body_bytes);
    let html = decode_to_utf8(body_bytes, &charset);

    StaticPage {
        url_final,
        charset,
        html,
    }
}

fn charset_from_captures(regex: &Regex, haystack: &str) -> Option<Charset> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes()).map(Charset::from_encoding)
}

fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    if let Some(charset) = charset_from_captures(&CHARSET_REGEX, content_type) {
        return charset;
    }

    // `<meta charset>` and `<meta http-equiv=... content="...; charset=...">`
    // both carry a `charset=` token inside a meta tag.
    let search_bytes = &body_bytes[..body_bytes.len().min(META_SCAN_BYTES)];
    let search_str = String::from_utf8_lossy(search_bytes);
    if let Some(charset) = charset_from_captures(&META_CHARSET_REGEX, &search_str) {
        return charset;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, false);
    Charset::from_encoding(detector.guess(None, true))
}

fn decode_to_utf8(body_bytes: &[u8], charset: &Charset) -> String {
    let encoding = charset.encoding();
    let (decoded, _encoding, had_errors) = encoding.decode(body_bytes);

    if had_errors {
        debug!(encoding = encoding.name(), "replaced malformed byte sequences");
    }

    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_charset_from_content_type() {
        let body = b"<html><head><title>Test</title></head></html>";
        let charset = detect_charset("text/html; charset=utf-8", body);
        assert!(matches!(charset, Charset::Utf8));
    }

    #[test]
    fn test_detect_charset_from_meta_tag() {
        let body = b"<html><head><meta charset=\"iso-8859-1\"><title>Test</title></head></html>";
        // encoding_rs treats ISO-8859-1 as its superset windows-1252
        let charset = detect_charset("text/html", body);
        assert!(matches!(charset, Charset::Windows1252));
    }

    #[test]
    fn test_detect_charset_from_meta_http_equiv() {
        let body = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\"><title>Test</title></head></html>";
        let charset = detect_charset("text/html", body);
        assert!(matches!(charset, Charset::Windows1252));
    }

    #[test]
    fn test_decode_latin1_paragraph() {
        let url = Url::parse("https://example.com/").unwrap();
        let body = Bytes::from_static(b"<p>caf\xe9</p>");
        let page = decode_body(url, &body, "text/html; charset=windows-1252");
        assert_eq!(page.html, "<p>café</p>");
        assert_eq!(page.charset, Charset::Windows1252);
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_rejected() {
        let decoded = decode_to_utf8(&[0x66, 0xff, 0x6f], &Charset::Utf8);
        assert_eq!(decoded, "f\u{FFFD}o");
    }
}
