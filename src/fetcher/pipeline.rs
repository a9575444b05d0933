use crate::fetcher::types::{Charset, PageResponse};
use bytes::Bytes;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

const REPLACEMENT_CHAR: char = '\u{FFFD}';

static CHARSET_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).ok());

// Covers both `<meta charset=gbk>` and the http-equiv content form.
static LEGACY_META_CHARSET_REGEX: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*?charset\s*=\s*["']?\s*(gbk|gb2312)\b"#).ok()
});

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    body_bytes: Bytes,
    content_type: &str,
) -> PageResponse {
    let encoding = header_encoding(content_type).unwrap_or(encoding_rs::UTF_8);
    let (mut body_utf8, mut used) = decode(&body_bytes, encoding);
    let mut repaired = false;

    // Second pass: a UTF-8 decode that produced mojibake on a page declaring
    // a legacy Chinese charset is redone with that charset.
    if std::ptr::eq(used, encoding_rs::UTF_8)
        && let Some(legacy) = legacy_redecode_target(&body_utf8)
    {
        debug!(charset = legacy.name(), "re-decoding body with declared legacy charset");
        (body_utf8, used) = decode(&body_bytes, legacy);
        repaired = true;
    }

    PageResponse {
        url_final,
        status,
        body_utf8,
        charset: Charset::from_encoding(used),
        repaired,
    }
}

/// Charset named in a `Content-Type` header, if encoding_rs knows it.
pub fn header_encoding(content_type: &str) -> Option<&'static Encoding> {
    let captures = CHARSET_REGEX.as_ref()?.captures(content_type)?;
    let label = captures.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// Legacy Chinese charset declared by a `<meta>` tag in the markup.
pub fn declared_legacy_charset(markup: &str) -> Option<&'static Encoding> {
    let captures = LEGACY_META_CHARSET_REGEX.as_ref()?.captures(markup)?;
    let label = captures.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// Both conditions are required: pages correctly served as UTF-8 often keep
/// a stale `gb2312` declaration around.
pub fn legacy_redecode_target(decoded: &str) -> Option<&'static Encoding> {
    if !decoded.contains(REPLACEMENT_CHAR) {
        return None;
    }
    declared_legacy_charset(decoded)
}

fn decode(body_bytes: &[u8], encoding: &'static Encoding) -> (String, &'static Encoding) {
    let (decoded, actual, _had_errors) = encoding.decode(body_bytes);
    (decoded.into_owned(), actual)
}
