use std::fmt;

use url::{Url, form_urlencoded};

use crate::error::{Error, Result};

/// Production API host.
pub const API_URL: &str = "https://api.monzo.com";
/// Production host users are sent to when authorizing a third-party application.
pub const AUTH_URL: &str = "https://auth.monzo.com";

/// A typed representation of Monzo API endpoints.
///
/// Endpoints are relative; [`MonzoEndpoint::to_url`] resolves them against the configured
/// API base so the same client can talk to production or to a local stub server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonzoEndpoint {
    Token,
    Accounts,
    Balance,
    Transactions,
    Transaction(String),
    Feed,
    Webhooks,
    Webhook(String),
    AttachmentUpload,
    AttachmentRegister,
    AttachmentDeregister,
}

impl MonzoEndpoint {
    fn segments(&self) -> Vec<&str> {
        match self {
            Self::Token => vec!["oauth2", "token"],
            Self::Accounts => vec!["accounts"],
            Self::Balance => vec!["balance"],
            Self::Transactions => vec!["transactions"],
            Self::Transaction(id) => vec!["transactions", id.as_str()],
            Self::Feed => vec!["feed"],
            Self::Webhooks => vec!["webhooks"],
            Self::Webhook(id) => vec!["webhooks", id.as_str()],
            Self::AttachmentUpload => vec!["attachment", "upload"],
            Self::AttachmentRegister => vec!["attachment", "register"],
            Self::AttachmentDeregister => vec!["attachment", "deregister"],
        }
    }

    /// Resolves the endpoint against `base`, keeping any path prefix the base carries.
    pub fn to_url(&self, base: &str) -> Result<Url> {
        let mut url = Url::parse(base).map_err(|_| Error::InvalidEndpoint)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidEndpoint)?
            .pop_if_empty()
            .extend(self.segments());
        Ok(url)
    }
}

impl fmt::Display for MonzoEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

/// Form-encodes a single query string value.
pub(crate) fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
