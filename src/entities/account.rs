use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Client,
    endpoints::MonzoEndpoint,
    error::Result,
    utils::date_format::monzo_datetime_format,
};

/// An account owned by the authorised user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier, used by every account-scoped call
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "monzo_datetime_format")]
    pub created: OffsetDateTime,
}

#[derive(Deserialize)]
struct ListResponse {
    accounts: Vec<Account>,
}

/// Retrieve the accounts owned by the currently authorised user.
#[instrument(skip(client))]
pub async fn list(client: &Client) -> Result<Vec<Account>> {
    let response: ListResponse = client.get(MonzoEndpoint::Accounts, None).await?;
    Ok(response.accounts)
}
