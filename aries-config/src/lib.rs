//! Loader for fetch profiles with YAML + environment overlays.
//!
//! A profile names a target URL together with the options, headers and
//! cookies a [`FetchClient`] should start with. Sources merge in the order
//! they are added; `ARIES__`-prefixed environment variables sit underneath
//! them. String values may reference `${VAR}` and are expanded after merging.
use aries_http::{FetchClient, FetchOptions, ReqwestTransport, Transport};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct AriesConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub profiles: Vec<FetchProfile>,
}

impl AriesConfig {
    pub fn profile(&self, id: &str) -> Option<&FetchProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchProfile {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub options: FetchOptions,
    /// `name1=value1&name2=value2`
    #[serde(default)]
    pub headers: Option<String>,
    /// `name1=value1;name2=value2`
    #[serde(default)]
    pub cookies: Option<String>,
    /// Domain for `cookies`; the target host when unset.
    #[serde(default)]
    pub cookie_domain: Option<String>,
}

impl FetchProfile {
    /// Network client preloaded with this profile.
    pub fn build_client(&self) -> aries_http::Result<FetchClient> {
        self.build_client_with(ReqwestTransport::new())
    }

    pub fn build_client_with<T: Transport>(
        &self,
        transport: T,
    ) -> aries_http::Result<FetchClient<T>> {
        let mut client = FetchClient::with_transport(&self.url, transport)?;
        client.configure(&self.url, self.options.clone())?;
        if let Some(headers) = &self.headers {
            client.add_headers_str(headers)?;
        }
        if let Some(cookies) = &self.cookies {
            client.add_cookies(cookies, self.cookie_domain.as_deref().unwrap_or_default())?;
        }
        Ok(client)
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring.
pub struct AriesConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for AriesConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AriesConfigLoader {
    /// Start with `ARIES__` environment overrides only.
    ///
    /// ```
    /// use aries_config::AriesConfigLoader;
    ///
    /// let config = AriesConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nprofiles: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert!(config.profiles.is_empty());
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("ARIES").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the format follows the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use aries_config::AriesConfigLoader;
    /// use aries_http::UserAgentMode;
    ///
    /// let cfg = AriesConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// profiles:
    ///   - id: "catalog"
    ///     url: "https://manga.example.com/list"
    ///     options:
    ///       timeout: 8000
    ///       user_agent_mode: "auto-mobile"
    ///     cookies: "lang=ja;adult=1"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// let profile = cfg.profile("catalog").unwrap();
    /// assert_eq!(profile.options.timeout, 8000);
    /// assert_eq!(profile.options.user_agent_mode, UserAgentMode::AutoMobile);
    ///
    /// let client = profile.build_client().unwrap();
    /// assert_eq!(client.cookies().len(), 2);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge every source, expand `${VAR}` placeholders and deserialize.
    pub fn load(self) -> Result<AriesConfig, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
