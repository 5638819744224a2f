use serde::{Deserialize, Serialize};

use crate::{
    Client,
    endpoints::{MonzoEndpoint, encode_query_value},
    error::{self, Result},
};

/// A URL the API calls each time a matching event happens on an account.
///
/// Failed deliveries are retried by the API itself with exponential backoff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub account_id: String,
    pub url: String,
}

#[derive(Deserialize)]
struct RegisterResponse {
    webhook: Webhook,
}

#[derive(Deserialize)]
struct ListResponse {
    webhooks: Vec<Webhook>,
}

/// Register a webhook receiving notifications for `account_id`.
#[instrument(skip(client))]
pub async fn register(client: &Client, account_id: &str, url: &str) -> Result<Webhook> {
    error::require("account_id", account_id)?;
    error::require("url", url)?;

    let response: RegisterResponse = client
        .post_form(
            MonzoEndpoint::Webhooks,
            &[("account_id", account_id), ("url", url)],
        )
        .await?;
    Ok(response.webhook)
}

/// List the webhooks registered on an account.
#[instrument(skip(client))]
pub async fn list(client: &Client, account_id: &str) -> Result<Vec<Webhook>> {
    error::require("account_id", account_id)?;

    let query = format!("account_id={}", encode_query_value(account_id));
    let response: ListResponse = client.get(MonzoEndpoint::Webhooks, Some(&query)).await?;
    Ok(response.webhooks)
}

/// Delete a webhook. The API stops sending notifications to it immediately.
#[instrument(skip(client))]
pub async fn delete(client: &Client, webhook_id: &str) -> Result<()> {
    error::require("webhook_id", webhook_id)?;

    client
        .delete(MonzoEndpoint::Webhook(webhook_id.to_string()))
        .await
}
