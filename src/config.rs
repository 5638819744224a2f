use crate::endpoints::{API_URL, AUTH_URL};
use crate::error::Result;
use crate::oauth::KeyPair;

/// Where the client connects to and which application credentials it uses.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the resource and token endpoints.
    pub api_url: String,
    /// Base URL users are redirected to for the authorization code flow.
    pub auth_url: String,
    /// Application credentials. Only needed for the token grants; a client created from an
    /// existing access token can do without.
    pub key_pair: Option<KeyPair>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            auth_url: AUTH_URL.to_string(),
            key_pair: None,
        }
    }
}

impl Config {
    /// Production configuration using the given application credentials.
    #[must_use]
    pub fn new(key_pair: KeyPair) -> Self {
        Self {
            key_pair: Some(key_pair),
            ..Self::default()
        }
    }

    /// Builds a configuration from the environment.
    ///
    /// `MONZO_CLIENT_ID` and `MONZO_CLIENT_SECRET` are required; `MONZO_API_URL` and
    /// `MONZO_AUTH_URL` override the production hosts when set.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            api_url: std::env::var("MONZO_API_URL").unwrap_or(defaults.api_url),
            auth_url: std::env::var("MONZO_AUTH_URL").unwrap_or(defaults.auth_url),
            key_pair: Some(KeyPair::from_env()?),
        })
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }
}
