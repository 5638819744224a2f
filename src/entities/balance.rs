use serde::{Deserialize, Serialize};

use crate::{
    Client,
    endpoints::{MonzoEndpoint, encode_query_value},
    error::{self, Result},
};

/// A snapshot of an account's balance. Amounts are in minor units of the currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Currently available balance; negative only when overdrawn
    pub balance: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Amount spent today, typically zero or negative
    #[serde(default)]
    pub spend_today: i64,
}

/// Read the balance of an account.
#[instrument(skip(client))]
pub async fn get(client: &Client, account_id: &str) -> Result<Balance> {
    error::require("account_id", account_id)?;

    let query = format!("account_id={}", encode_query_value(account_id));
    client.get(MonzoEndpoint::Balance, Some(&query)).await
}
