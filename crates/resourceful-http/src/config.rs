//! Resource configuration.
//!
//! [`ResourceConfig`] is what a [`Resource`](crate::Resource) is built from.
//! It can be assembled in code or loaded from a YAML/JSON document through
//! [`ResourceSettings`], which rejects unknown keys.

use resourceful_common_secret::SecretString;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthInfoProvider, Credentials, StaticAuthInfo};
use crate::client::HttpConfig;
use crate::error::{ResourceError, Result};
use crate::logging::{LogSink, TracingSink};
use crate::transport::Transport;

/// Redirect hops a GET follows before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Construction options for a resource.
#[derive(Clone)]
pub struct ResourceConfig {
    /// Sink for info/debug/warn lines. No logging when unset.
    pub logger: Option<Arc<dyn LogSink>>,
    /// Credentials for 401 challenges. No credentials when unset.
    pub auth_info: Option<Arc<dyn AuthInfoProvider>>,
    /// Transport to use. An [`HttpTransport`](crate::HttpTransport) built from
    /// `http` when unset.
    pub transport: Option<Arc<dyn Transport>>,
    /// Settings for the default transport.
    pub http: HttpConfig,
    /// Redirect hops a GET follows.
    pub max_redirects: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            logger: None,
            auth_info: None,
            transport: None,
            http: HttpConfig::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl fmt::Debug for ResourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceConfig")
            .field("logger", &self.logger.is_some())
            .field("auth_info", &self.auth_info.is_some())
            .field("transport", &self.transport.is_some())
            .field("http", &self.http)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

impl ResourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn auth_info(mut self, provider: Arc<dyn AuthInfoProvider>) -> Self {
        self.auth_info = Some(provider);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Check the settings the default transport depends on.
    pub fn validate(&self) -> Result<()> {
        if self.transport.is_some() {
            return Ok(());
        }
        if self.http.connect_timeout.is_zero() {
            return Err(ResourceError::config("connect timeout must be non-zero"));
        }
        if self.http.request_timeout.is_zero() {
            return Err(ResourceError::config("request timeout must be non-zero"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(ResourceError::config("user agent must not be empty"));
        }
        if reqwest::header::HeaderValue::try_from(self.http.user_agent.as_str()).is_err() {
            return Err(ResourceError::config(format!(
                "user agent `{}` is not a valid header value",
                self.http.user_agent
            )));
        }
        Ok(())
    }

    /// Load from a YAML document.
    pub fn from_yaml(document: &str) -> Result<Self> {
        let settings: ResourceSettings =
            serde_yaml::from_str(document).map_err(|e| ResourceError::config(e.to_string()))?;
        settings.into_config()
    }

    /// Load from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let settings: ResourceSettings =
            serde_json::from_value(value).map_err(|e| ResourceError::config(e.to_string()))?;
        settings.into_config()
    }
}

/// Serializable form of [`ResourceConfig`].
///
/// ```yaml
/// logger: true
/// max_redirects: 5
/// http:
///   connect_timeout_secs: 5
///   user_agent: my-app/1.0
/// auth_info:
///   - realm: files
///     account: bob
///     password: hunter2
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSettings {
    /// Log through `tracing`.
    #[serde(default)]
    pub logger: bool,
    #[serde(default)]
    pub max_redirects: Option<usize>,
    #[serde(default)]
    pub http: HttpSettings,
    /// Static per-realm credentials.
    #[serde(default)]
    pub auth_info: Vec<RealmCredentials>,
}

/// Overrides for [`HttpConfig`]; unset fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub pool_max_idle_per_host: Option<usize>,
    pub gzip: Option<bool>,
}

/// One `auth_info` entry. A missing realm applies to every realm.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealmCredentials {
    #[serde(default)]
    pub realm: Option<String>,
    pub account: String,
    pub password: SecretString,
}

impl HttpSettings {
    fn apply(self, mut config: HttpConfig) -> HttpConfig {
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }
        if let Some(idle) = self.pool_max_idle_per_host {
            config.pool_max_idle_per_host = idle;
        }
        if let Some(gzip) = self.gzip {
            config.gzip = gzip;
        }
        config
    }
}

impl ResourceSettings {
    /// Build and validate the config these settings describe.
    pub fn into_config(self) -> Result<ResourceConfig> {
        let mut config = ResourceConfig::new().http(self.http.apply(HttpConfig::default()));

        if let Some(max_redirects) = self.max_redirects {
            config = config.max_redirects(max_redirects);
        }
        if self.logger {
            config = config.logger(Arc::new(TracingSink));
        }
        if !self.auth_info.is_empty() {
            let mut provider = StaticAuthInfo::new();
            for entry in self.auth_info {
                let credentials = Credentials::new(entry.account, entry.password);
                match entry.realm {
                    Some(realm) => provider.insert(realm, credentials),
                    None => provider.set_fallback(credentials),
                }
            }
            config = config.auth_info(Arc::new(provider));
        }

        config.validate()?;
        Ok(config)
    }
}
