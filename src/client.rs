use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, header};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use url::Url;

use crate::config::Config;
use crate::endpoints::MonzoEndpoint;
use crate::entities::{
    account::{self, Account},
    attachment::{self, Attachment, UploadUrl},
    balance::{self, Balance},
    feed::{self, BasicFeedItem, FeedItemType},
    transaction::{self, Expand, Transaction},
    webhook::{self, Webhook},
};
use crate::error::{ApiError, Error, Result};
use crate::oauth::{AccessToken, AuthorizationClient};
use crate::pagination::PaginationOptions;

#[derive(Clone, Debug)]
/// This is the client that is used for interacting with the Monzo API. It holds the current
/// access token and issues every resource call with it.
///
/// Clones share the same token, so a refresh through one clone is seen by all of them. Calls
/// read the token once when they start; a call racing a refresh uses either the old or the new
/// token, and the old one is invalid server-side as soon as the refresh completes.
pub struct Client {
    http_client: reqwest::Client,
    api_url: String,
    authorization: Option<AuthorizationClient>,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl Client {
    /// Creates an unauthenticated client. Application credentials in `config` enable
    /// [`Client::authenticate`], [`Client::authenticate_with_code`] and
    /// [`Client::refresh_access_token`].
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::new();
        let authorization = config
            .key_pair
            .map(|key_pair| {
                AuthorizationClient::with_http_client(
                    http_client.clone(),
                    key_pair,
                    config.api_url.clone(),
                    config.auth_url,
                )
            })
            .transpose()?;

        Ok(Self {
            http_client,
            api_url: config.api_url,
            authorization,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Creates a client configured from the environment. See [`Config::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    /// Creates a production client from an access token obtained elsewhere. Such a client
    /// cannot refresh its token.
    #[must_use]
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: Config::default().api_url,
            authorization: None,
            token: Arc::new(RwLock::new(Some(AccessToken::new(access_token)))),
        }
    }

    /// Starts the client off with an existing token.
    #[must_use]
    pub fn with_access_token(mut self, token: AccessToken) -> Self {
        self.token = Arc::new(RwLock::new(Some(token)));
        self
    }

    /// The authorization client built from the configured key pair, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<&AuthorizationClient> {
        self.authorization.as_ref()
    }

    fn require_authorization(&self) -> Result<&AuthorizationClient> {
        self.authorization
            .as_ref()
            .ok_or_else(|| Error::invalid_argument("key_pair"))
    }

    /// Authenticates with the user's own credentials and stores the resulting token.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        let token = self
            .require_authorization()?
            .authenticate_with_password(username, password)
            .await?;
        self.set_access_token(token).await;
        Ok(())
    }

    /// Exchanges an authorization code and stores the resulting token.
    #[instrument(skip(self, code))]
    pub async fn authenticate_with_code(&self, code: &str, redirect_uri: &str) -> Result<()> {
        let token = self
            .require_authorization()?
            .exchange_authorization_code(code, redirect_uri)
            .await?;
        self.set_access_token(token).await;
        Ok(())
    }

    /// Refreshes the access token using the stored refresh token.
    ///
    /// The access token, refresh token and expiry are replaced in place; the user id is kept
    /// when the token endpoint does not repeat it. Refreshing is never done automatically:
    /// callers decide when to refresh, typically on [`Error::is_unauthorized`] or when
    /// [`AccessToken::expires_within`] says so.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Result<()> {
        let authorization = self.require_authorization()?;
        let current = self.access_token().await.ok_or(Error::Unauthenticated)?;
        let refresh_token = current
            .refresh_token()
            .ok_or_else(|| Error::invalid_argument("refresh_token"))?;

        let mut token = authorization.refresh_access_token(refresh_token).await?;
        if token.user_id().is_none() {
            if let Some(user_id) = current.user_id() {
                token = token.with_user_id(user_id);
            }
        }

        trace!(user_id = ?token.user_id(), "replacing access token");
        *self.token.write().await = Some(token);
        Ok(())
    }

    /// Replaces the current token.
    pub async fn set_access_token(&self, token: AccessToken) {
        trace!(user_id = ?token.user_id(), "updating access token");
        *self.token.write().await = Some(token);
    }

    /// A snapshot of the current token.
    pub async fn access_token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    /// Drops the current token, returning the client to the unauthenticated state.
    pub async fn clear_access_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Build a request object with authentication headers.
    pub(crate) async fn build_request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let guard = self.token.read().await;
        let token = guard.as_ref().ok_or(Error::Unauthenticated)?;
        Ok(self
            .http_client
            .request(method, url)
            .bearer_auth(token.secret())
            .header(header::ACCEPT, "application/json"))
    }

    fn endpoint_url(&self, endpoint: &MonzoEndpoint, query: Option<&str>) -> Result<Url> {
        let mut url = endpoint.to_url(&self.api_url)?;
        if let Some(query) = query {
            url.set_query(Some(query));
        }
        Ok(url)
    }

    /// Perform an authenticated `GET` request. `query` is used verbatim as the query string.
    #[instrument(skip(self))]
    pub async fn get<R: DeserializeOwned>(
        &self,
        endpoint: MonzoEndpoint,
        query: Option<&str>,
    ) -> Result<R> {
        let url = self.endpoint_url(&endpoint, query)?;
        trace!(%url, "making GET request");
        let response = self.build_request(Method::GET, url).await?.send().await?;
        Self::handle_response(response).await
    }

    /// Perform an authenticated `POST` request with a form-encoded body.
    #[instrument(skip(self, form))]
    pub async fn post_form<R: DeserializeOwned, T: Serialize + ?Sized + fmt::Debug>(
        &self,
        endpoint: MonzoEndpoint,
        form: &T,
    ) -> Result<R> {
        let response = self.send_form(Method::POST, &endpoint, form).await?;
        Self::handle_response(response).await
    }

    /// Perform an authenticated `POST` request whose response body is discarded.
    #[instrument(skip(self, form))]
    pub async fn post_form_empty<T: Serialize + ?Sized + fmt::Debug>(
        &self,
        endpoint: MonzoEndpoint,
        form: &T,
    ) -> Result<()> {
        let response = self.send_form(Method::POST, &endpoint, form).await?;
        Self::handle_empty_response(response).await
    }

    /// Perform an authenticated `PATCH` request with a form-encoded body.
    #[instrument(skip(self, form))]
    pub async fn patch_form<R: DeserializeOwned, T: Serialize + ?Sized + fmt::Debug>(
        &self,
        endpoint: MonzoEndpoint,
        form: &T,
    ) -> Result<R> {
        let response = self.send_form(Method::PATCH, &endpoint, form).await?;
        Self::handle_response(response).await
    }

    /// Perform an authenticated `DELETE` request.
    #[instrument(skip(self))]
    pub async fn delete(&self, endpoint: MonzoEndpoint) -> Result<()> {
        let url = self.endpoint_url(&endpoint, None)?;
        trace!(%url, "making DELETE request");
        let response = self.build_request(Method::DELETE, url).await?.send().await?;
        Self::handle_empty_response(response).await
    }

    async fn send_form<T: Serialize + ?Sized + fmt::Debug>(
        &self,
        method: Method,
        endpoint: &MonzoEndpoint,
        form: &T,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint_url(endpoint, None)?;
        trace!(%method, %url, ?form, "making form request");
        Ok(self.build_request(method, url).await?.form(form).send().await?)
    }

    /// `PUT` raw content to a pre-signed storage URL.
    ///
    /// The URL carries its own authorization, so the API bearer token is not sent.
    #[instrument(skip(self, upload_url, content))]
    pub(crate) async fn put_upload(
        &self,
        upload_url: &str,
        content_type: &str,
        content: reqwest::Body,
    ) -> Result<()> {
        let url = Url::parse(upload_url).map_err(|_| Error::InvalidEndpoint)?;
        trace!(host = ?url.host_str(), content_type, "uploading attachment content");

        let response = self
            .http_client
            .put(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(content)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "attachment content uploaded");
            Ok(())
        } else {
            let body = response.text().await?;
            warn!(%status, "attachment upload rejected by storage");
            Err(Error::upload_failed(status, body))
        }
    }

    #[instrument(skip(response))]
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string();

        tracing::debug!(
            "Response from {}: status={}, entity_type={}",
            url,
            status,
            entity_type
        );

        let text = response.text().await?;
        tracing::debug!("Response body size: {} bytes", text.len());
        tracing::trace!("Response text:\n{}", text);

        if !status.is_success() {
            tracing::error!("Unexpected status code: {}", status);
            return Err(ApiError::from_response(status, text).into());
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                "Deserialization error: {}, near position: {} - response text around that position: {}",
                e,
                e.column(),
                &text
                    .chars()
                    .skip(e.column().saturating_sub(30))
                    .take(100)
                    .collect::<String>()
            );
            Error::DeserializationError(e, Some(text.clone()))
        })
    }

    async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        tracing::debug!("Response from {}: status={}", response.url(), status);

        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await?;
            tracing::error!("Unexpected status code: {}", status);
            Err(ApiError::from_response(status, text).into())
        }
    }

    /// Access the accounts API
    #[must_use]
    pub fn accounts(&self) -> AccountsApi<'_> {
        AccountsApi { client: self }
    }

    /// Access the transactions API
    #[must_use]
    pub fn transactions(&self) -> TransactionsApi<'_> {
        TransactionsApi { client: self }
    }

    /// Access the feed API
    #[must_use]
    pub fn feed(&self) -> FeedApi<'_> {
        FeedApi { client: self }
    }

    /// Access the webhooks API
    #[must_use]
    pub fn webhooks(&self) -> WebhooksApi<'_> {
        WebhooksApi { client: self }
    }

    /// Access the attachments API
    #[must_use]
    pub fn attachments(&self) -> AttachmentsApi<'_> {
        AttachmentsApi { client: self }
    }
}

/// API handler for account and balance endpoints
#[derive(Debug)]
pub struct AccountsApi<'a> {
    client: &'a Client,
}

impl AccountsApi<'_> {
    /// List the accounts owned by the authorised user
    pub async fn list(&self) -> Result<Vec<Account>> {
        account::list(self.client).await
    }

    /// Read the balance of an account
    pub async fn balance(&self, account_id: &str) -> Result<Balance> {
        balance::get(self.client, account_id).await
    }
}

/// API handler for Transactions endpoints
#[derive(Debug)]
pub struct TransactionsApi<'a> {
    client: &'a Client,
}

impl TransactionsApi<'_> {
    /// Retrieve a single transaction, optionally with its merchant expanded
    pub async fn get(&self, transaction_id: &str, expand: Option<Expand>) -> Result<Transaction> {
        transaction::get(self.client, transaction_id, expand).await
    }

    /// List the transactions on an account
    pub async fn list(
        &self,
        account_id: &str,
        expand: Option<Expand>,
        pagination: Option<&PaginationOptions>,
    ) -> Result<Vec<Transaction>> {
        transaction::list(self.client, account_id, expand, pagination).await
    }

    /// Annotate a transaction with metadata; empty values delete keys
    pub async fn annotate(
        &self,
        transaction_id: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<Transaction> {
        transaction::annotate(self.client, transaction_id, metadata).await
    }
}

/// API handler for the Feed endpoint
#[derive(Debug)]
pub struct FeedApi<'a> {
    client: &'a Client,
}

impl FeedApi<'_> {
    /// Create a feed item from a raw parameter map
    pub async fn create(
        &self,
        account_id: &str,
        item_type: FeedItemType,
        url: Option<&str>,
        params: &HashMap<String, String>,
    ) -> Result<()> {
        feed::create(self.client, account_id, item_type, url, params).await
    }

    /// Create a `basic` feed item
    pub async fn create_basic(
        &self,
        account_id: &str,
        item: &BasicFeedItem,
        url: Option<&str>,
    ) -> Result<()> {
        feed::create_basic(self.client, account_id, item, url).await
    }
}

/// API handler for Webhooks endpoints
#[derive(Debug)]
pub struct WebhooksApi<'a> {
    client: &'a Client,
}

impl WebhooksApi<'_> {
    /// Register a webhook on an account
    pub async fn register(&self, account_id: &str, url: &str) -> Result<Webhook> {
        webhook::register(self.client, account_id, url).await
    }

    /// List the webhooks registered on an account
    pub async fn list(&self, account_id: &str) -> Result<Vec<Webhook>> {
        webhook::list(self.client, account_id).await
    }

    /// Delete a webhook
    pub async fn delete(&self, webhook_id: &str) -> Result<()> {
        webhook::delete(self.client, webhook_id).await
    }
}

/// API handler for Attachment endpoints
#[derive(Debug)]
pub struct AttachmentsApi<'a> {
    client: &'a Client,
}

impl AttachmentsApi<'_> {
    /// Obtain a temporary URL to upload a file to
    pub async fn request_upload_url(&self, file_name: &str, file_type: &str) -> Result<UploadUrl> {
        attachment::request_upload_url(self.client, file_name, file_type).await
    }

    /// Register an already hosted file against a transaction
    pub async fn register(
        &self,
        external_id: &str,
        file_url: &str,
        file_type: &str,
    ) -> Result<Attachment> {
        attachment::register(self.client, external_id, file_url, file_type).await
    }

    /// Upload a file and register it against a transaction
    pub async fn upload(
        &self,
        file_name: &str,
        file_type: &str,
        external_id: &str,
        content: impl Into<reqwest::Body>,
    ) -> Result<Attachment> {
        attachment::upload(self.client, file_name, file_type, external_id, content).await
    }

    /// Deregister an attachment
    pub async fn delete(&self, attachment_id: &str) -> Result<()> {
        attachment::delete(self.client, attachment_id).await
    }
}
