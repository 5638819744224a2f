use std::time::Duration;

use oauth2::basic::BasicTokenType;
use reqwest::header;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::client::Client;
use crate::config::Config;
use crate::endpoints::{MonzoEndpoint, encode_query_value};
use crate::error::{self, Error, Result};

/// Stores the OAuth 2 client ID and client secret.
#[derive(Debug, Clone)]
pub struct KeyPair(pub(crate) oauth2::ClientId, pub(crate) oauth2::ClientSecret);

impl KeyPair {
    /// Creates a new `KeyPair` from the provided `client_id` and `client_secret` strings.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self(
            oauth2::ClientId::new(client_id),
            oauth2::ClientSecret::new(client_secret),
        )
    }

    /// Creates a new `KeyPair` from `MONZO_CLIENT_ID` and `MONZO_CLIENT_SECRET` environment variables.
    pub fn from_env() -> Result<Self> {
        let client_id =
            std::env::var("MONZO_CLIENT_ID").map_err(|_| Error::MissingEnvVar("MONZO_CLIENT_ID"))?;
        let client_secret = std::env::var("MONZO_CLIENT_SECRET")
            .map_err(|_| Error::MissingEnvVar("MONZO_CLIENT_SECRET"))?;
        Ok(Self::new(client_id, client_secret))
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        self.0.as_str()
    }
}

/// The body of a successful response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    access_token: oauth2::AccessToken,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<oauth2::RefreshToken>,
    #[serde(default)]
    token_type: Option<BasicTokenType>,
    #[serde(default)]
    user_id: Option<String>,
}

/// An OAuth 2 access token together with what is needed to refresh it.
///
/// The expiry is stored as an absolute time computed when the token was issued. It is
/// informational only: the client never refreshes on its own.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: oauth2::AccessToken,
    refresh_token: Option<oauth2::RefreshToken>,
    expires_at: Option<OffsetDateTime>,
    user_id: Option<String>,
    client_id: Option<String>,
    token_type: Option<BasicTokenType>,
}

impl AccessToken {
    /// Wraps a bearer token obtained elsewhere. Its expiry is unknown.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: oauth2::AccessToken::new(value.into()),
            refresh_token: None,
            expires_at: None,
            user_id: None,
            client_id: None,
            token_type: Some(BasicTokenType::Bearer),
        }
    }

    /// Builds the session token from a token endpoint response received at `issued_at`.
    #[must_use]
    pub fn from_response(response: TokenResponse, issued_at: OffsetDateTime) -> Self {
        Self {
            value: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response.expires_in.and_then(|secs| {
                let secs = i64::try_from(secs).ok()?;
                issued_at.checked_add(time::Duration::seconds(secs))
            }),
            user_id: response.user_id,
            client_id: response.client_id,
            token_type: response.token_type,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(oauth2::RefreshToken::new(refresh_token.into()));
        self
    }

    #[must_use]
    pub fn with_expires_at(mut self, expires_at: OffsetDateTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// The bearer token sent in the `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.value.secret()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.secret().as_str())
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    #[must_use]
    pub fn token_type(&self) -> Option<&BasicTokenType> {
        self.token_type.as_ref()
    }

    /// Whether the token expires within `margin` from now. Tokens without a known expiry never do;
    /// a margin reaching past the representable range covers every known expiry.
    #[must_use]
    pub fn expires_within(&self, margin: Duration) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        time::Duration::try_from(margin)
            .ok()
            .and_then(|margin| OffsetDateTime::now_utc().checked_add(margin))
            .is_none_or(|deadline| expires_at <= deadline)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::ZERO)
    }
}

/// Acquires and refreshes access tokens.
///
/// The authorization client is stateless: it hands every token it obtains back to the
/// caller and keeps none of them.
#[derive(Debug, Clone)]
pub struct AuthorizationClient {
    http_client: reqwest::Client,
    key_pair: KeyPair,
    api_url: String,
    auth_url: String,
}

impl AuthorizationClient {
    /// Creates an authorization client against the production hosts.
    pub fn new(key_pair: KeyPair) -> Result<Self> {
        Self::from_config(&Config::new(key_pair))
    }

    /// Creates an authorization client from a configuration carrying a key pair.
    pub fn from_config(config: &Config) -> Result<Self> {
        let key_pair = config
            .key_pair
            .clone()
            .ok_or_else(|| Error::invalid_argument("key_pair"))?;
        Self::with_http_client(
            reqwest::Client::new(),
            key_pair,
            config.api_url.clone(),
            config.auth_url.clone(),
        )
    }

    pub(crate) fn with_http_client(
        http_client: reqwest::Client,
        key_pair: KeyPair,
        api_url: String,
        auth_url: String,
    ) -> Result<Self> {
        error::require("client_id", key_pair.0.as_str())?;
        error::require("client_secret", key_pair.1.secret())?;
        Ok(Self {
            http_client,
            key_pair,
            api_url,
            auth_url,
        })
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        self.key_pair.client_id()
    }

    /// Generates the URL to send a user to so they can authorize this application.
    ///
    /// `state` is inserted verbatim, so callers must escape it themselves; `redirect_uri` is
    /// percent-encoded. Blank values are left out.
    #[must_use]
    pub fn authorize_url(&self, state: Option<&str>, redirect_uri: Option<&str>) -> String {
        let mut url = format!(
            "{}/?response_type=code&client_id={}",
            self.auth_url.trim_end_matches('/'),
            self.key_pair.client_id()
        );

        if let Some(state) = state.filter(|s| !s.trim().is_empty()) {
            url.push_str("&state=");
            url.push_str(state);
        }

        if let Some(redirect_uri) = redirect_uri.filter(|s| !s.trim().is_empty()) {
            url.push_str("&redirect_uri=");
            url.push_str(&encode_query_value(redirect_uri));
        }

        url
    }

    /// Exchanges an authorization code for an access token.
    #[instrument(skip(self, code))]
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken> {
        error::require("code", code)?;
        error::require("redirect_uri", redirect_uri)?;

        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.key_pair.0.as_str()),
            ("client_secret", self.key_pair.1.secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// Acquires an access token with the user's own credentials.
    #[instrument(skip(self, password))]
    pub async fn authenticate_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccessToken> {
        error::require("username", username)?;
        error::require("password", password)?;

        self.request_token(&[
            ("grant_type", "password"),
            ("client_id", self.key_pair.0.as_str()),
            ("client_secret", self.key_pair.1.secret()),
            ("username", username),
            ("password", password),
        ])
        .await
    }

    /// Mints a new access and refresh token pair. The refresh token can only be used once.
    #[instrument(skip_all)]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessToken> {
        error::require("refresh_token", refresh_token)?;

        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.key_pair.0.as_str()),
            ("client_secret", self.key_pair.1.secret()),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<AccessToken> {
        let url = MonzoEndpoint::Token.to_url(&self.api_url)?;
        let grant_type = form.first().map_or("", |(_, value)| *value);
        trace!(%url, grant_type, "requesting access token");

        let issued_at = OffsetDateTime::now_utc();
        let response = self
            .http_client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let token: TokenResponse = Client::handle_response(response).await?;
        debug!(grant_type, "access token issued");
        Ok(AccessToken::from_response(token, issued_at))
    }
}
