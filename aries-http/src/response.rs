use std::fmt;
use std::io::{self, Cursor, Read};

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use url::Url;

use crate::error::{HttpError, Result};
use crate::transport::RawResponse;

const DEFAULT_CHARSET: &str = "utf-8";

enum Body {
    Pending(Box<dyn Read + Send>),
    Drained(Bytes),
    /// The stream broke mid-read; what was read is gone for good.
    Failed(io::ErrorKind, String),
}

/// Outcome of the latest successful fetch.
///
/// The transport body is read at most once: the first accessor drains it
/// and every later call is served from the cached payload. A read that
/// fails part way makes every later access fail too.
pub struct ResponseResult {
    status: StatusCode,
    url: Url,
    headers: HeaderMap,
    attempts: u32,
    body: Body,
}

impl ResponseResult {
    pub(crate) fn new(raw: RawResponse, attempts: u32) -> Self {
        Self {
            status: raw.status,
            url: raw.url,
            headers: raw.headers,
            attempts,
            body: Body::Pending(raw.body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Final URL after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Attempts consumed to obtain this response (1..=6).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_drained(&self) -> bool {
        matches!(self.body, Body::Drained(_))
    }

    /// Charset declared by `Content-Type`, `utf-8` otherwise.
    pub fn charset(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| {
                ct.split(';')
                    .filter_map(|param| param.trim().split_once('='))
                    .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
                    .map(|(_, value)| value.trim().trim_matches('"'))
            })
            .filter(|charset| !charset.is_empty())
            .unwrap_or(DEFAULT_CHARSET)
    }

    pub fn bytes(&mut self) -> Result<Bytes> {
        let interrupted = Body::Failed(io::ErrorKind::Interrupted, "body read did not finish".into());
        let mut stream = match std::mem::replace(&mut self.body, interrupted) {
            Body::Drained(bytes) => {
                self.body = Body::Drained(bytes.clone());
                return Ok(bytes);
            }
            Body::Failed(kind, message) => {
                self.body = Body::Failed(kind, message.clone());
                return Err(HttpError::Body(io::Error::new(kind, message)));
            }
            Body::Pending(stream) => stream,
        };

        let mut buf = Vec::new();
        if let Err(err) = stream.read_to_end(&mut buf) {
            tracing::warn!(
                url = %self.url,
                read = buf.len(),
                error = %err,
                "http.response.body_failed"
            );
            self.body = Body::Failed(err.kind(), err.to_string());
            return Err(HttpError::Body(err));
        }

        let payload = Bytes::from(buf);
        tracing::debug!(
            url = %self.url,
            body_len = payload.len(),
            "http.response.body"
        );
        self.body = Body::Drained(payload.clone());
        Ok(payload)
    }

    /// Payload decoded with [`charset`](Self::charset). Unknown charsets
    /// fall back to lossy UTF-8.
    pub fn text(&mut self) -> Result<String> {
        let payload = self.bytes()?;
        let charset = self.charset();
        match aries_text::decode_with(&payload, charset) {
            Ok(text) => Ok(text),
            Err(err) => {
                tracing::debug!(charset, error = %err, "http.response.charset_fallback");
                Ok(String::from_utf8_lossy(&payload).into_owned())
            }
        }
    }

    /// Re-readable stream over the materialised payload.
    pub fn reader(&mut self) -> Result<Cursor<Bytes>> {
        Ok(Cursor::new(self.bytes()?))
    }
}

impl fmt::Debug for ResponseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseResult")
            .field("status", &self.status)
            .field("url", &self.url.as_str())
            .field("attempts", &self.attempts)
            .field("drained", &self.is_drained())
            .finish()
    }
}
