use encoding_rs::Encoding;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::warn;

use crate::fetcher::FetchError;

/// Only the head of the document is searched for a declared charset.
const SNIFF_BYTES: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

/// Decode a response body to UTF-8, replacing undecodable bytes.
pub fn decode_body(content_type: &str, body: &[u8]) -> (String, &'static Encoding) {
    let encoding = detect_encoding(content_type, body);
    let (decoded, actual, had_errors) = encoding.decode(body);
    if had_errors {
        warn!(encoding = actual.name(), "body contained undecodable bytes");
    }
    (decoded.into_owned(), actual)
}

/// Header charset, then a `<meta>` declaration, then a statistical guess.
pub fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    let declared = |regex: &Regex, text: &str| {
        regex
            .captures(text)
            .and_then(|caps| Encoding::for_label(caps[1].trim().as_bytes()))
    };

    if let Some(encoding) = declared(&CHARSET_REGEX, content_type) {
        return encoding;
    }

    let head = &body[..body.len().min(SNIFF_BYTES)];
    let head_text = String::from_utf8_lossy(head);
    if let Some(encoding) = declared(&META_CHARSET_REGEX, &head_text) {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, body.len() <= SNIFF_BYTES);
    detector.guess(None, true)
}

/// Serialized outer HTML of every element matching `query`; `None` when
/// nothing matched.
pub fn isolate_fragments(html: &str, query: &str) -> Result<Option<Vec<String>>, FetchError> {
    let selector =
        Selector::parse(query).map_err(|_| FetchError::InvalidQuery(query.to_string()))?;
    let document = Html::parse_document(html);
    let fragments: Vec<String> = document.select(&selector).map(|element| element.html()).collect();
    Ok((!fragments.is_empty()).then_some(fragments))
}
