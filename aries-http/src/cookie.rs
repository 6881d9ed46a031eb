//! Per-client cookie jar.
//!
//! Cookies are keyed by `(name, domain)`; inserting the same key again
//! replaces the value. A cookie applies to a host when the host equals its
//! domain or is a subdomain of it.

use crate::error::{HttpError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

impl Cookie {
    pub fn new(name: &str, value: &str, domain: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HttpError::MalformedCookie(format!(
                "empty cookie name (value {value:?})"
            )));
        }
        if name.contains(|c: char| c == ';' || c == ',' || c.is_whitespace()) {
            return Err(HttpError::MalformedCookie(format!(
                "invalid cookie name {name:?}"
            )));
        }
        let value = value.trim();
        if value.contains(|c: char| c == ';' || c.is_control()) {
            return Err(HttpError::MalformedCookie(format!(
                "invalid value for cookie {name:?}"
            )));
        }
        Ok(Self {
            name: name.to_owned(),
            value: value.to_owned(),
            domain: normalize_domain(domain),
        })
    }

    pub fn applies_to(&self, host: &str) -> bool {
        domain_matches(host, &self.domain)
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// `host` equals `domain` or is a subdomain of it.
fn domain_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Parse `name1=value1;name2=value2` into cookies scoped to `domain`.
///
/// Segments are split on their first `=`, so values may contain `=`.
/// Blank segments are skipped; a segment without `=` fails the whole string.
pub fn parse_cookie_string(raw: &str, domain: &str) -> Result<Vec<Cookie>> {
    raw.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (name, value) = segment.split_once('=').ok_or_else(|| {
                HttpError::MalformedCookie(format!("segment {segment:?} has no '='"))
            })?;
            Cookie::new(name, value, domain)
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cookie: Cookie) {
        match self
            .cookies
            .iter_mut()
            .find(|c| c.name == cookie.name && c.domain == cookie.domain)
        {
            Some(existing) => existing.value = cookie.value,
            None => self.cookies.push(cookie),
        }
    }

    pub fn remove(&mut self, name: &str, domain: &str) {
        let domain = normalize_domain(domain);
        self.cookies
            .retain(|c| !(c.name == name && c.domain == domain));
    }

    /// Cookies applicable to `host`, in insertion order.
    pub fn for_host(&self, host: &str) -> Vec<&Cookie> {
        self.cookies.iter().filter(|c| c.applies_to(host)).collect()
    }

    /// `Cookie` header value for `host`, if any cookie applies.
    pub fn header_value(&self, host: &str) -> Option<String> {
        let pairs: Vec<String> = self
            .for_host(host)
            .into_iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }

    /// Merge one `Set-Cookie` header. The cookie is scoped to its `Domain`
    /// attribute, or to `origin_host` when absent; `Max-Age<=0` deletes it.
    /// Unparseable headers, and a `Domain` that `origin_host` does not belong
    /// to, are ignored.
    pub fn store_set_cookie(&mut self, header: &str, origin_host: &str) {
        let mut parts = header.split(';').map(str::trim);
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            tracing::debug!(header, "http.cookie.ignored");
            return;
        };

        let mut domain = origin_host.to_owned();
        let mut expired = false;
        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            if key.eq_ignore_ascii_case("domain") && !val.trim().is_empty() {
                domain = val.trim().to_owned();
            } else if key.eq_ignore_ascii_case("max-age") {
                expired = val.trim().parse::<i64>().is_ok_and(|secs| secs <= 0);
            }
        }

        if !domain_matches(origin_host, &normalize_domain(&domain)) {
            tracing::debug!(header, origin_host, domain, "http.cookie.foreign_domain");
            return;
        }
        if expired {
            self.remove(name.trim(), &domain);
            return;
        }
        match Cookie::new(name, value, &domain) {
            Ok(cookie) => self.insert(cookie),
            Err(err) => tracing::debug!(header, error = %err, "http.cookie.ignored"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }
}
