//! Client configuration.
//!
//! `ClientConfig` is `Deserialize` so applications can nest it in their own
//! config files; `from_env` covers the common twelve-factor setup.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::ApiError;

pub const PRODUCTION_URL: &str = "https://api.nowpayments.io/v1";
pub const SANDBOX_URL: &str = "https://api-sandbox.nowpayments.io/v1";

pub const ENV_API_KEY: &str = "NOWPAYMENTS_API_KEY";
pub const ENV_BASE_URL: &str = "NOWPAYMENTS_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "NOWPAYMENTS_TIMEOUT_SECS";

/// Credentials for the sub-partner passthrough endpoints.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credentials {
    Bearer { token: String },
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Whole-request timeout. Config files give it as `timeout_secs`.
    #[serde(default, rename = "timeout_secs", deserialize_with = "timeout_from_secs")]
    pub timeout: Option<Duration>,
}

fn timeout_from_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}

fn default_base_url() -> String {
    PRODUCTION_URL.to_string()
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Production configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            credentials: None,
            timeout: None,
        }
    }

    pub fn sandbox(mut self) -> Self {
        self.base_url = SANDBOX_URL.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ApiError> {
        self.base_url = normalize_base_url(&base_url.into())?;
        Ok(self)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Bearer { token: token.into() });
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Read `NOWPAYMENTS_API_KEY`, `NOWPAYMENTS_BASE_URL` and
    /// `NOWPAYMENTS_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{ENV_API_KEY} is not set")))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config = config.with_base_url(base_url)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ApiError::Config(format!("{ENV_TIMEOUT_SECS}={raw:?}: {e}")))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Check the fields a deserialized config may have left inconsistent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::Config("api key is empty".to_string()));
        }
        normalize_base_url(&self.base_url)?;
        if self.timeout == Some(Duration::ZERO) {
            return Err(ApiError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Parse the base URL and strip trailing slashes so paths can be appended.
fn normalize_base_url(raw: &str) -> Result<String, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::Config(format!("base url {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::Config(format!(
            "base url {raw:?}: unsupported scheme {}",
            url.scheme()
        )));
    }
    if url.query().is_some() {
        return Err(ApiError::Config(format!("base url {raw:?} must not carry a query")));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
