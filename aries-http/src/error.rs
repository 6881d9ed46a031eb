use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("malformed cookie: {0}")]
    MalformedCookie(String),
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// Last transport failure once every attempt is used up, as produced by
    /// the transport.
    #[error(transparent)]
    Fetch(#[from] TransportError),
    #[error("no response available: no fetch has succeeded yet")]
    NoResponse,
    #[error("failed to read response body: {0}")]
    Body(#[source] std::io::Error),
}

/// Failure of a single attempt. Every variant is retried alike.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned {status} for {url}: {snippet}")]
    Status {
        status: StatusCode,
        url: String,
        snippet: String,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("gave up after {hops} redirects at {url}")]
    TooManyRedirects { hops: u32, url: String },
}

pub type Result<T> = std::result::Result<T, HttpError>;
