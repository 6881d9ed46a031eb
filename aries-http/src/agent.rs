//! Built-in User-Agent pools and the rotation mode.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const DESKTOP_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

pub const MOBILE_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 18_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_7 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.7 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S911B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Android 14; Mobile; rv:133.0) Gecko/133.0 Firefox/133.0",
];

/// How the `User-Agent` header is chosen for each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserAgentMode {
    /// Keep one agent for every attempt (the configured one, or the first
    /// desktop entry).
    Fixed,
    /// Fresh random desktop agent per attempt.
    #[default]
    AutoDesktop,
    /// Fresh random mobile agent per attempt.
    AutoMobile,
}

impl UserAgentMode {
    pub fn pool(self) -> Option<&'static [&'static str]> {
        match self {
            UserAgentMode::Fixed => None,
            UserAgentMode::AutoDesktop => Some(DESKTOP_AGENTS),
            UserAgentMode::AutoMobile => Some(MOBILE_AGENTS),
        }
    }

    /// Agent for the next attempt; `None` in fixed mode.
    pub fn next_agent(self) -> Option<&'static str> {
        let pool = self.pool()?;
        pool.choose(&mut rand::thread_rng()).copied()
    }
}

pub fn default_agent() -> &'static str {
    DESKTOP_AGENTS[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_draws_from_matching_pool() {
        for _ in 0..32 {
            let desktop = UserAgentMode::AutoDesktop.next_agent().unwrap();
            assert!(DESKTOP_AGENTS.contains(&desktop));
            let mobile = UserAgentMode::AutoMobile.next_agent().unwrap();
            assert!(MOBILE_AGENTS.contains(&mobile));
        }
        assert_eq!(UserAgentMode::Fixed.next_agent(), None);
    }

    #[test]
    fn modes_use_kebab_case() {
        let mode: UserAgentMode = serde_json::from_str("\"auto-mobile\"").unwrap();
        assert_eq!(mode, UserAgentMode::AutoMobile);
        assert_eq!(
            serde_json::to_string(&UserAgentMode::AutoDesktop).unwrap(),
            "\"auto-desktop\""
        );
    }
}
