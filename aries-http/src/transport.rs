//! The network seam under the retry loop.
//!
//! [`FetchClient`](crate::FetchClient) only ever talks to a [`Transport`];
//! tests swap in closures, production uses [`ReqwestTransport`].

use std::fmt;
use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::error::TransportError;
use crate::headers::snip_body;

/// One fully prepared hop of an attempt.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Duration,
}

/// Successful or redirecting exchange with a body that has not been read
/// yet.
pub struct RawResponse {
    pub status: StatusCode,
    pub url: Url,
    pub headers: HeaderMap,
    /// Single-use body stream.
    pub body: Box<dyn Read + Send>,
}

impl RawResponse {
    /// In-memory response, mostly for fakes.
    pub fn from_bytes(status: StatusCode, url: Url, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            url,
            headers,
            body: Box::new(std::io::Cursor::new(body.into())),
        }
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

pub trait Transport {
    /// Perform one hop of an attempt without following redirects.
    /// Statuses other than success and redirection are failures.
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;

    /// Drop any pooled connections. The next `send` reacquires them.
    fn release(&mut self) {}
}

impl<F> Transport for F
where
    F: Fn(&Request) -> Result<RawResponse, TransportError>,
{
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        self(request)
    }
}

/// Blocking `reqwest` transport.
///
/// The underlying client (connection pool, TLS sessions) is built on the
/// first `send` and dropped by [`Transport::release`] or with the transport.
/// TLS negotiates the strongest protocol both sides support. Redirects are
/// handed back to the caller so cookies can be collected on every hop; the
/// per-request timeout bounds connecting too.
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    client: OnceLock<reqwest::blocking::Client>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.client.get().is_some()
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, TransportError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let built = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()?;
        tracing::debug!("http.transport.connected");
        Ok(self.client.get_or_init(|| built))
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client()?
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .timeout(request.timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status();
        let url = response.url().clone();
        if !status.is_success() && !status.is_redirection() {
            let snippet = response
                .bytes()
                .map(|b| snip_body(&b))
                .unwrap_or_default();
            return Err(TransportError::Status {
                status,
                url: url.to_string(),
                snippet,
            });
        }

        Ok(RawResponse {
            status,
            url,
            headers: response.headers().clone(),
            body: Box::new(response),
        })
    }

    fn release(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("http.transport.released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_is_built_lazily_and_released() {
        let mut transport = ReqwestTransport::new();
        assert!(!transport.is_connected());
        transport.client().unwrap();
        assert!(transport.is_connected());
        transport.release();
        assert!(!transport.is_connected());
    }

    #[test]
    fn closures_are_transports() {
        let fake = |req: &Request| {
            Ok::<_, TransportError>(RawResponse::from_bytes(
                StatusCode::OK,
                req.url.clone(),
                HeaderMap::new(),
                "ok",
            ))
        };
        let request = Request {
            method: Method::GET,
            url: Url::parse("http://example.com/").unwrap(),
            headers: HeaderMap::new(),
            body: None,
            timeout: Duration::from_secs(1),
        };
        let mut raw = fake.send(&request).unwrap();
        let mut body = String::new();
        raw.body.read_to_string(&mut body).unwrap();
        assert_eq!(body, "ok");
    }
}
