use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONNECTION, CONTENT_LENGTH, COOKIE, LOCATION,
    REFERER, SET_COOKIE, USER_AGENT,
};
use reqwest::{Method, StatusCode};
use url::Url;
use uuid::Uuid;

use crate::agent::{default_agent, UserAgentMode};
use crate::cookie::{parse_cookie_string, Cookie, CookieJar};
use crate::error::{HttpError, Result, TransportError};
use crate::headers::{header_pair, make_curl, parse_header_string, raw_enabled, redact};
use crate::options::{parse_target, FetchOptions, Resolved};
use crate::response::ResponseResult;
use crate::retry;
use crate::transport::{RawResponse, ReqwestTransport, Request, Transport};

/// Redirect hops followed within one attempt.
pub const MAX_REDIRECTS: u32 = 10;

/// Blocking pause between attempts.
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Stateful client bound to one target.
///
/// Headers and cookies accumulate across calls until reset. At most one
/// response is held: every fetch drops the previous one first. The
/// transport's network handle is acquired on the first request and released
/// by [`close`](Self::close) or when the client is dropped, whichever way
/// the last fetch ended.
pub struct FetchClient<T: Transport = ReqwestTransport> {
    target: Url,
    options: FetchOptions,
    resolved: Resolved,
    headers: HeaderMap,
    cookies: CookieJar,
    transport: T,
    response: Option<ResponseResult>,
    sleeper: Sleeper,
}

impl FetchClient<ReqwestTransport> {
    /// Client for `url` with default options over the network.
    ///
    /// ```
    /// use aries_http::{FetchClient, HttpError};
    ///
    /// assert!(FetchClient::new("https://manga.example.com/book/7").is_ok());
    /// assert!(matches!(FetchClient::new("book/7"), Err(HttpError::Config(_))));
    /// ```
    pub fn new(url: &str) -> Result<Self> {
        Self::with_transport(url, ReqwestTransport::new())
    }
}

impl<T: Transport> FetchClient<T> {
    pub fn with_transport(url: &str, transport: T) -> Result<Self> {
        let options = FetchOptions::default();
        Ok(Self {
            target: parse_target(url)?,
            resolved: options.resolve()?,
            options,
            headers: HeaderMap::new(),
            cookies: CookieJar::new(),
            transport,
            response: None,
            sleeper: Arc::new(std::thread::sleep),
        })
    }

    /// Replace the pause used between attempts.
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Point the client at `url` and apply `options`. Takes effect on the
    /// next fetch; nothing changes when validation fails.
    pub fn configure(&mut self, url: &str, options: FetchOptions) -> Result<&mut Self> {
        let target = parse_target(url)?;
        let resolved = options.resolve()?;
        self.target = target;
        self.resolved = resolved;
        self.options = options;
        Ok(self)
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn method(&self) -> &Method {
        &self.resolved.method
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ----- headers -----

    /// Set one header; a later value for the same name replaces it.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn add_headers<I, K, V>(&mut self, headers: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs = headers
            .into_iter()
            .map(|(k, v)| header_pair(k.as_ref(), v.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.merge_headers(pairs);
        Ok(self)
    }

    /// Merge `name1=value1&name2=value2`. Nothing is merged if any segment
    /// is malformed.
    pub fn add_headers_str(&mut self, raw: &str) -> Result<&mut Self> {
        let pairs = parse_header_string(raw)?;
        self.merge_headers(pairs);
        Ok(self)
    }

    pub fn add_header_map(&mut self, headers: HeaderMap) -> &mut Self {
        self.merge_headers(
            headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        self
    }

    // `insert`, not `append`: one value per name, last write wins.
    fn merge_headers(&mut self, pairs: impl IntoIterator<Item = (HeaderName, HeaderValue)>) {
        for (name, value) in pairs {
            self.headers.insert(name, value);
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn reset_headers(&mut self) {
        self.headers.clear();
    }

    // ----- cookies -----

    /// Store a cookie. An empty `domain` scopes it to the target host.
    pub fn add_cookie(&mut self, name: &str, value: &str, domain: &str) -> Result<&mut Self> {
        let cookie = Cookie::new(name, value, self.cookie_domain(domain))?;
        self.cookies.insert(cookie);
        Ok(self)
    }

    /// Store every pair of `name1=value1;name2=value2`. Nothing is stored
    /// if any segment is malformed.
    pub fn add_cookies(&mut self, raw: &str, domain: &str) -> Result<&mut Self> {
        let parsed = parse_cookie_string(raw, self.cookie_domain(domain))?;
        for cookie in parsed {
            self.cookies.insert(cookie);
        }
        Ok(self)
    }

    /// Cookies sent to the target host. Empty when none apply.
    pub fn cookies(&self) -> Vec<&Cookie> {
        self.cookies_for(&self.target)
    }

    pub fn cookies_for(&self, url: &Url) -> Vec<&Cookie> {
        url.host_str()
            .map(|host| self.cookies.for_host(host))
            .unwrap_or_default()
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn reset_cookies(&mut self) {
        self.cookies.clear();
    }

    fn cookie_domain<'a>(&'a self, domain: &'a str) -> &'a str {
        if domain.trim().is_empty() {
            self.target.host_str().unwrap_or_default()
        } else {
            domain
        }
    }

    // ----- exchange -----

    /// Perform the configured exchange, retrying transient failures.
    pub fn fetch(&mut self) -> Result<&mut ResponseResult> {
        let method = self.resolved.method.clone();
        self.exchange(method, None)
    }

    /// POST `payload` to the target with the same retry policy as
    /// [`fetch`](Self::fetch).
    ///
    /// Only this call uses POST: the configured method is left untouched, so
    /// a later `fetch()` still sends what [`configure`](Self::configure) set.
    pub fn post(&mut self, payload: impl Into<Bytes>) -> Result<&mut ResponseResult> {
        self.exchange(Method::POST, Some(payload.into()))
    }

    fn exchange(&mut self, method: Method, body: Option<Bytes>) -> Result<&mut ResponseResult> {
        self.response = None;

        let req_id = Uuid::new_v4().simple().to_string();
        let sleeper = Arc::clone(&self.sleeper);
        let (raw, attempts) = retry::run(
            &req_id,
            |attempt| self.run_attempt(&req_id, attempt, method.clone(), body.clone()),
            &*sleeper,
        )?;

        Ok(self.response.insert(ResponseResult::new(raw, attempts)))
    }

    /// One attempt: follow redirects hop by hop, absorbing `Set-Cookie` from
    /// every hop so the next one already carries them.
    fn run_attempt(
        &mut self,
        req_id: &str,
        attempt: u32,
        mut method: Method,
        mut body: Option<Bytes>,
    ) -> std::result::Result<RawResponse, TransportError> {
        let mut url = self.target.clone();
        for hop in 0..=MAX_REDIRECTS {
            let request = self.prepare(method.clone(), url.clone(), body.clone());
            self.log_request(req_id, attempt, hop, &request);
            let started = Instant::now();
            let raw = self.transport.send(&request)?;
            tracing::debug!(
                req_id,
                attempt,
                hop,
                status = %raw.status,
                duration_ms = started.elapsed().as_millis() as u64,
                headers = ?redact(&raw.headers),
                "http.response.headers"
            );
            self.absorb_cookies(&raw);

            if !raw.status.is_redirection() {
                return Ok(raw);
            }
            let Some(next) = redirect_target(&raw) else {
                return Err(TransportError::Status {
                    status: raw.status,
                    url: raw.url.to_string(),
                    snippet: String::new(),
                });
            };
            let status = raw.status;
            let switch_to_get = if status == StatusCode::SEE_OTHER {
                method != Method::HEAD
            } else if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
                method == Method::POST
            } else {
                false
            };
            if switch_to_get {
                method = Method::GET;
                body = None;
            }
            tracing::debug!(req_id, attempt, hop, status = %raw.status, location = %next, "http.redirect");
            url = next;
        }
        Err(TransportError::TooManyRedirects {
            hops: MAX_REDIRECTS,
            url: url.to_string(),
        })
    }

    /// Build the request for one hop. Rotating agent modes draw a new
    /// `User-Agent` every time.
    fn prepare(&self, method: Method, url: Url, body: Option<Bytes>) -> Request {
        let mut headers = self.headers.clone();

        let agent = match self.options.user_agent_mode {
            UserAgentMode::Fixed => self.options.user_agent.as_deref(),
            mode => mode.next_agent(),
        };
        if let Some(value) = agent.and_then(|a| HeaderValue::from_str(a).ok()) {
            headers.insert(USER_AGENT, value);
        } else if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, HeaderValue::from_static(default_agent()));
        }

        if !headers.contains_key(REFERER) {
            let referer = self.resolved.referer.as_ref().unwrap_or(&self.target);
            if let Ok(value) = HeaderValue::from_str(referer.as_str()) {
                headers.insert(REFERER, value);
            }
        }
        if let Some(value) = self
            .options
            .accept
            .as_deref()
            .and_then(|a| HeaderValue::from_str(a).ok())
        {
            headers.entry(ACCEPT).or_insert(value);
        }
        if !self.options.keep_alive {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }
        if let Some(value) = url
            .host_str()
            .and_then(|host| self.cookies.header_value(host))
            .and_then(|v| HeaderValue::from_str(&v).ok())
        {
            headers.insert(COOKIE, value);
        }
        if let Some(payload) = &body {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(payload.len()));
        }

        Request {
            method,
            url,
            headers,
            body,
            timeout: self.resolved.timeout,
        }
    }

    fn log_request(&self, req_id: &str, attempt: u32, hop: u32, request: &Request) {
        tracing::debug!(
            req_id,
            attempt,
            hop,
            max_attempts = retry::MAX_ATTEMPTS,
            method = %request.method,
            host_path = %format!("{}{}", request.url.host_str().unwrap_or("-"), request.url.path()),
            timeout_ms = request.timeout.as_millis() as u64,
            user_agent = ?request.headers.get(USER_AGENT),
            has_body = request.body.is_some(),
            "http.request.start"
        );
        if raw_enabled() {
            tracing::debug!(target: "http.raw", req_id, curl = %make_curl(request), "request");
        }
    }

    fn absorb_cookies(&mut self, raw: &RawResponse) {
        let host = raw.url.host_str().unwrap_or_default();
        for value in raw.headers.get_all(SET_COOKIE) {
            if let Ok(header) = value.to_str() {
                self.cookies.store_set_cookie(header, host);
            }
        }
    }

    // ----- accessors -----

    pub fn response(&self) -> Option<&ResponseResult> {
        self.response.as_ref()
    }

    pub fn response_mut(&mut self) -> Result<&mut ResponseResult> {
        self.response.as_mut().ok_or(HttpError::NoResponse)
    }

    pub fn bytes(&mut self) -> Result<Bytes> {
        self.response_mut()?.bytes()
    }

    pub fn text(&mut self) -> Result<String> {
        self.response_mut()?.text()
    }

    pub fn reader(&mut self) -> Result<Cursor<Bytes>> {
        self.response_mut()?.reader()
    }

    /// Drop the held response and the transport's network handle.
    pub fn close(&mut self) {
        self.response = None;
        self.transport.release();
    }
}

/// Absolute `Location` of a redirect, resolved against the hop's URL.
fn redirect_target(raw: &RawResponse) -> Option<Url> {
    let location = raw.headers.get(LOCATION)?.to_str().ok()?;
    raw.url.join(location).ok()
}

impl<T: Transport> fmt::Debug for FetchClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchClient")
            .field("target", &self.target.as_str())
            .field("options", &self.options)
            .field("headers", &redact(&self.headers))
            .field("cookies", &self.cookies.len())
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Drop for FetchClient<T> {
    fn drop(&mut self) {
        self.close();
    }
}
