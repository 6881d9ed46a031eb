//! Resilient, per-target HTTP fetch client.
//!
//! - [`FetchClient`]: one target URL, cumulative headers and cookies,
//!   rotating User-Agent, blocking fetch with a bounded retry loop
//! - [`Transport`]: the seam the retry loop is written against; the
//!   production implementation is [`ReqwestTransport`]
//! - [`ResponseResult`]: the latest response, drained lazily and cached
//!
//! Example (no_run):
//! ```rust,no_run
//! # fn demo() -> Result<(), aries_http::HttpError> {
//! use aries_http::{FetchClient, FetchOptions, UserAgentMode};
//!
//! let mut client = FetchClient::new("https://manga.example.com/book/42")?;
//! client.configure(
//!     "https://manga.example.com/book/42",
//!     FetchOptions::default().with_user_agent_mode(UserAgentMode::AutoMobile),
//! )?;
//! client.add_cookies("session=abc;lang=en", "manga.example.com")?;
//! let html = client.fetch()?.text()?;
//! let title = aries_text::extract_one(&html, "<title>", "</title>").ok().flatten();
//! # let _ = title;
//! # Ok(()) }
//! ```
//!
//! Redirects are followed by the client itself, one hop at a time, so
//! cookies set along the way land in its jar.
//!
//! Observability: `tracing` events `http.request.start`,
//! `http.response.headers`, `http.redirect`, `http.retrying`, `http.error`
//! and `http.response.body`, all tagged with a per-call `req_id`. Set
//! `ARIES_HTTP_RAW=1` to also log a curl line per attempt (target `http.raw`).

pub mod agent;
mod client;
pub mod cookie;
mod error;
pub mod headers;
mod options;
mod response;
pub mod retry;
pub mod transport;

pub use agent::UserAgentMode;
pub use client::{FetchClient, Sleeper, MAX_REDIRECTS};
pub use cookie::{Cookie, CookieJar};
pub use error::{HttpError, Result, TransportError};
pub use options::FetchOptions;
pub use response::ResponseResult;
pub use retry::{RetryState, MAX_ATTEMPTS};
pub use transport::{RawResponse, ReqwestTransport, Request, Transport};

/// Milliseconds since the UNIX epoch, for cache-busting query values.
pub fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
