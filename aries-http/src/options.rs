use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::agent::UserAgentMode;
use crate::error::{HttpError, Result};

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Recognised per-client options.
///
/// ```
/// use aries_http::{FetchOptions, UserAgentMode};
///
/// let opts = FetchOptions::default()
///     .with_timeout_ms(8_000)
///     .with_user_agent_mode(UserAgentMode::AutoMobile)
///     .with_referer("https://manga.example.com/");
///
/// assert_eq!(opts.timeout, 8_000);
/// assert_eq!(opts.method, "GET");
/// assert!(opts.keep_alive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout: u64,
    pub user_agent_mode: UserAgentMode,
    pub method: String,
    /// Sent as `Referer`; the target URL is used when unset.
    pub referer: Option<String>,
    pub keep_alive: bool,
    /// Agent used in [`UserAgentMode::Fixed`].
    pub user_agent: Option<String>,
    pub accept: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_MS,
            user_agent_mode: UserAgentMode::default(),
            method: Method::GET.to_string(),
            referer: None,
            keep_alive: true,
            user_agent: None,
            accept: None,
        }
    }
}

impl FetchOptions {
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = ms;
        self
    }

    pub fn with_user_agent_mode(mut self, mode: UserAgentMode) -> Self {
        self.user_agent_mode = mode;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub(crate) fn resolve(&self) -> Result<Resolved> {
        if self.timeout == 0 {
            return Err(HttpError::Config("timeout must be positive".into()));
        }
        let method = Method::from_bytes(self.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| HttpError::Config(format!("invalid method {:?}", self.method)))?;
        let referer = self
            .referer
            .as_deref()
            .map(|r| {
                Url::parse(r).map_err(|e| HttpError::Config(format!("invalid referer {r:?}: {e}")))
            })
            .transpose()?;
        for (label, value) in [("user_agent", &self.user_agent), ("accept", &self.accept)] {
            if let Some(v) = value {
                HeaderValue::from_str(v)
                    .map_err(|e| HttpError::Config(format!("invalid {label} {v:?}: {e}")))?;
            }
        }
        Ok(Resolved {
            method,
            timeout: Duration::from_millis(self.timeout),
            referer,
        })
    }
}

/// Validated, typed view of [`FetchOptions`].
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub method: Method,
    pub timeout: Duration,
    pub referer: Option<Url>,
}

/// Absolute URL with a host; anything else is a configuration error.
pub(crate) fn parse_target(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url.trim()).map_err(|e| HttpError::Config(format!("invalid URL {url:?}: {e}")))?;
    if !parsed.has_host() {
        return Err(HttpError::Config(format!("URL {url:?} has no host")));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let resolved = FetchOptions::default().resolve().unwrap();
        assert_eq!(resolved.method, Method::GET);
        assert_eq!(resolved.timeout, Duration::from_millis(5_000));
        assert!(resolved.referer.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = FetchOptions::default().with_timeout_ms(0).resolve().unwrap_err();
        assert!(matches!(err, HttpError::Config(_)));
    }

    #[test]
    fn method_is_normalised() {
        let resolved = FetchOptions::default().with_method("post").resolve().unwrap();
        assert_eq!(resolved.method, Method::POST);
        assert!(FetchOptions::default().with_method("GE T").resolve().is_err());
    }

    #[test]
    fn referer_must_be_a_url() {
        assert!(FetchOptions::default().with_referer("not a url").resolve().is_err());
    }

    #[test]
    fn header_backed_options_are_validated() {
        let bad = FetchOptions::default().with_user_agent("agent\nsmuggled");
        assert!(matches!(bad.resolve(), Err(HttpError::Config(_))));
    }

    #[test]
    fn targets_must_be_absolute() {
        assert!(parse_target("https://manga.example.com/book/1").is_ok());
        assert!(parse_target("http://127.0.0.1:8080").is_ok());
        for bad in ["", "/book/1", "manga.example.com", "http://", "mailto:a@b.c"] {
            assert!(
                matches!(parse_target(bad), Err(HttpError::Config(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: FetchOptions =
            serde_json::from_str(r#"{"timeout": 2500, "user_agent_mode": "fixed"}"#).unwrap();
        assert_eq!(opts.timeout, 2500);
        assert_eq!(opts.user_agent_mode, UserAgentMode::Fixed);
        assert_eq!(opts.method, "GET");
        assert!(opts.keep_alive);
    }
}
