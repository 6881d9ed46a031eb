//! Header parsing and log-safe rendering.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};

use crate::error::{HttpError, Result};
use crate::transport::Request;

const RAW_ENV: &str = "ARIES_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_LEN: usize = 500;

pub fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| HttpError::MalformedHeader(format!("name {name:?}: {e}")))?;
    let header_value = HeaderValue::from_str(value.trim())
        .map_err(|e| HttpError::MalformedHeader(format!("value for {name:?}: {e}")))?;
    Ok((header_name, header_value))
}

/// Parse `name1=value1&name2=value2`. Blank segments are skipped.
pub fn parse_header_string(raw: &str) -> Result<Vec<(HeaderName, HeaderValue)>> {
    raw.split('&')
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            let (name, value) = segment.split_once('=').ok_or_else(|| {
                HttpError::MalformedHeader(format!("segment {segment:?} has no '='"))
            })?;
            header_pair(name, value)
        })
        .collect()
}

pub(crate) fn redact(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_secret(name) {
                "<redacted>".to_owned()
            } else {
                value.to_str().unwrap_or("<binary>").to_owned()
            };
            (name.as_str().to_owned(), shown)
        })
        .collect()
}

fn is_secret(name: &HeaderName) -> bool {
    *name == AUTHORIZATION || *name == COOKIE
}

pub(crate) fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Equivalent curl invocation, secrets redacted.
pub(crate) fn make_curl(request: &Request) -> String {
    let quote = |s: &str| s.replace('\'', r"'\''");
    let mut parts = vec!["curl".to_owned(), format!("-X{}", request.method)];
    for (name, value) in redact(&request.headers) {
        parts.push(format!("-H '{}: {}'", name, quote(&value)));
    }
    if let Some(body) = &request.body {
        match std::str::from_utf8(body) {
            Ok(text) if text.len() <= RAW_MAX_BODY => {
                parts.push(format!("--data-raw '{}'", quote(text)))
            }
            _ => parts.push(format!("--data-binary @- # ({} bytes)", body.len())),
        }
    }
    parts.push(format!("'{}'", request.url));
    parts.join(" ")
}

pub(crate) fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(SNIPPET_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_string_is_split_on_ampersand() {
        let pairs = parse_header_string("Accept=text/html&X-Requested-With=XMLHttpRequest").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "accept");
        assert_eq!(pairs[1].1, "XMLHttpRequest");
    }

    #[test]
    fn header_segment_without_equals_is_malformed() {
        let err = parse_header_string("Accept=text/html&broken").unwrap_err();
        assert!(matches!(err, HttpError::MalformedHeader(_)));
    }

    #[test]
    fn invalid_header_name_is_malformed() {
        assert!(matches!(
            header_pair("bad name", "x"),
            Err(HttpError::MalformedHeader(_))
        ));
        assert!(matches!(
            header_pair("X-Ok", "line\nbreak"),
            Err(HttpError::MalformedHeader(_))
        ));
    }

    #[test]
    fn cookies_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sid=secret"));
        headers.insert("accept", HeaderValue::from_static("*/*"));
        let shown = redact(&headers);
        assert!(shown.contains(&("cookie".to_owned(), "<redacted>".to_owned())));
        assert!(shown.contains(&("accept".to_owned(), "*/*".to_owned())));
    }

    #[test]
    fn snippets_are_bounded() {
        let long = "漫".repeat(600);
        let snip = snip_body(long.as_bytes());
        assert!(snip.ends_with("..."));
        assert_eq!(snip.chars().count(), SNIPPET_LEN + 3);
        assert_eq!(snip_body(b"short"), "short");
    }
}
