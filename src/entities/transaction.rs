use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Client,
    endpoints::{MonzoEndpoint, encode_query_value},
    entities::merchant::{Merchant, merchant_format},
    error::{self, Result},
    pagination::PaginationOptions,
    utils::{date_format::monzo_datetime_format, serde_helpers::empty_string_as_none},
};

/// Why a transaction was declined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclineReason {
    InsufficientFunds,
    CardInactive,
    CardBlocked,
    Other,
}

/// Related objects that can be expanded inline when fetching transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expand {
    Merchant,
}

impl fmt::Display for Expand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merchant => write!(f, "merchant"),
        }
    }
}

/// A movement of funds into or out of an account.
///
/// Amounts are in minor units of `currency`. Negative amounts are debits; positive ones are
/// credits such as refunds or top-ups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Balance of the account immediately after this transaction
    pub account_balance: i64,
    pub amount: i64,
    /// Only present on declined transactions
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub decline_reason: Option<DeclineReason>,
    #[serde(with = "monzo_datetime_format")]
    pub created: OffsetDateTime,
    pub currency: String,
    #[serde(default)]
    pub description: String,
    pub id: String,
    /// The merchant id, or the whole merchant when fetched with [`Expand::Merchant`]
    #[serde(default, with = "merchant_format")]
    pub merchant: Option<Merchant>,
    /// Key-value annotations private to this application
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Notes entered by the user
    #[serde(default)]
    pub notes: String,
    /// True only for top-ups
    #[serde(default)]
    pub is_load: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled: Option<bool>,
    /// One of general, eating_out, expenses, transport, cash, bills, entertainment, shopping,
    /// holidays, groceries, or `monzo` for top-ups
    #[serde(default)]
    pub category: String,
}

impl Transaction {
    #[must_use]
    pub fn is_top_up(&self) -> bool {
        self.is_load
    }

    #[must_use]
    pub fn is_declined(&self) -> bool {
        self.decline_reason.is_some()
    }

    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.amount < 0
    }
}

#[derive(Deserialize)]
struct SingleResponse {
    transaction: Transaction,
}

#[derive(Deserialize)]
struct ListResponse {
    transactions: Vec<Transaction>,
}

/// Retrieve a single transaction by its id.
///
/// The `expand[]` parameter is always sent, empty when `expand` is `None`.
#[instrument(skip(client))]
pub async fn get(client: &Client, transaction_id: &str, expand: Option<Expand>) -> Result<Transaction> {
    error::require("transaction_id", transaction_id)?;

    let query = format!(
        "expand[]={}",
        expand.map(|e| e.to_string()).unwrap_or_default()
    );
    let response: SingleResponse = client
        .get(
            MonzoEndpoint::Transaction(transaction_id.to_string()),
            Some(&query),
        )
        .await?;
    Ok(response.transaction)
}

/// List the transactions on an account.
#[instrument(skip(client))]
pub async fn list(
    client: &Client,
    account_id: &str,
    expand: Option<Expand>,
    pagination: Option<&PaginationOptions>,
) -> Result<Vec<Transaction>> {
    error::require("account_id", account_id)?;

    let query = list_query(account_id, expand, pagination);
    let response: ListResponse = client
        .get(MonzoEndpoint::Transactions, Some(&query))
        .await?;
    Ok(response.transactions)
}

fn list_query(
    account_id: &str,
    expand: Option<Expand>,
    pagination: Option<&PaginationOptions>,
) -> String {
    let mut query = format!("account_id={}", encode_query_value(account_id));
    if let Some(expand) = expand {
        query.push_str(&format!("&expand[]={expand}"));
    }
    if let Some(pagination) = pagination {
        pagination.apply_to_query(&mut query);
    }
    query
}

/// Store key-value annotations against a transaction.
///
/// Only the keys present in `metadata` are changed; an empty value deletes the key.
#[instrument(skip(client, metadata))]
pub async fn annotate(
    client: &Client,
    transaction_id: &str,
    metadata: &HashMap<String, String>,
) -> Result<Transaction> {
    error::require("transaction_id", transaction_id)?;

    let form = metadata_form(metadata);
    let response: SingleResponse = client
        .patch_form(MonzoEndpoint::Transaction(transaction_id.to_string()), &form)
        .await?;
    Ok(response.transaction)
}

fn metadata_form(metadata: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = metadata
        .iter()
        .map(|(key, value)| (format!("metadata[{key}]"), value.clone()))
        .collect();
    form.sort();
    form
}
