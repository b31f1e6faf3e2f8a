//! Configuration structures for Hush clients.
//!
//! This module provides the credentials and endpoint configuration needed to build a
//! [`Client`](crate::Client), realm-to-URL mapping, environment loading, and HTTP transport
//! tuning.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the API key id (OAuth client id).
pub const ENV_API_KEY_ID: &str = "HUSH_API_KEY_ID";

/// Environment variable holding the API key secret (OAuth client secret).
pub const ENV_API_KEY_SECRET: &str = "HUSH_API_KEY_SECRET";

/// Environment variable selecting the realm (`US` or `EU`).
pub const ENV_REALM: &str = "HUSH_REALM";

/// Environment variable overriding the base URL (development only).
pub const ENV_DEV_BASE_URL: &str = "HUSH_DEV_BASE_URL";

/// Token endpoint path relative to the base URL.
pub const DEFAULT_TOKEN_PATH: &str = "/v1/oauth/token";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("hush-rust/", env!("CARGO_PKG_VERSION"));

/// Hush deployment region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Realm {
    /// United States
    #[default]
    Us,
    /// European Union
    Eu,
}

impl Realm {
    /// Lowercase realm label used in hostnames.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Us => "us",
            Self::Eu => "eu",
        }
    }

    /// Production base URL for this realm.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://api.{}.hush-security.com", self.as_str())
    }
}

impl FromStr for Realm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            other => Err(Error::ConfigError(format!(
                "Unknown realm `{other}`, expected US or EU"
            ))),
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Connection and credential configuration for a Hush client.
///
/// `client_secret` is held as a [`SecretString`] and is redacted from `Debug` output.
#[derive(Debug, Validate)]
pub struct HushClientConfig {
    /// API base URL
    #[validate(url)]
    pub base_url: String,

    /// OAuth client id (API key id)
    #[validate(length(min = 1))]
    pub client_id: String,

    /// OAuth client secret (API key secret)
    pub client_secret: SecretString,

    /// Token endpoint path
    #[validate(length(min = 1))]
    pub token_path: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// User agent header value
    pub user_agent: String,
}

impl HushClientConfig {
    /// Create a configuration for the given base URL and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL is invalid or either credential is empty.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        };

        config.check()?;
        Ok(config)
    }

    /// Create a configuration pointing at the production URL for `realm`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if either credential is empty.
    pub fn for_realm(
        realm: Realm,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::new(realm.base_url(), client_id, client_secret)
    }

    /// Load configuration from `HUSH_*` environment variables.
    ///
    /// `HUSH_DEV_BASE_URL` takes precedence over `HUSH_REALM`, which defaults to `US`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if credentials are missing or the realm is unknown.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`HushClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let client_id = non_empty(ENV_API_KEY_ID)
            .ok_or_else(|| Error::ConfigError(format!("{ENV_API_KEY_ID} is not set")))?;
        let client_secret = non_empty(ENV_API_KEY_SECRET)
            .ok_or_else(|| Error::ConfigError(format!("{ENV_API_KEY_SECRET} is not set")))?;

        let base_url = match non_empty(ENV_DEV_BASE_URL) {
            Some(url) => url,
            None => non_empty(ENV_REALM)
                .map(|realm| realm.parse::<Realm>())
                .transpose()?
                .unwrap_or_default()
                .base_url(),
        };

        Self::new(base_url, client_id, client_secret)
    }

    /// Override the token endpoint path.
    #[must_use]
    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse and validate the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_base_url(&self) -> Result<Url, Error> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid base URL: {e}")))
    }

    /// Run field validation plus the secret check `validator` cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        if self.client_secret.expose_secret().is_empty() {
            return Err(Error::ConfigError(
                "Invalid configuration: client_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP transport configuration.
///
/// Configures timeouts and connection pooling of the underlying `reqwest` client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    /// Build a `reqwest` client from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the TLS backend cannot be initialised.
    pub fn build_http(&self, user_agent: &str) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(user_agent)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host);

        if !self.enable_compression {
            builder = builder.no_gzip();
        }

        builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
