#[macro_use]
extern crate tracing;

use std::time::Duration;

use anyhow::Result;
use time::OffsetDateTime;
use monzo_rs::{Client, Expand, PaginationOptions};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Client credentials come from MONZO_CLIENT_ID and MONZO_CLIENT_SECRET
    let client = Client::from_env()?;
    let username = std::env::var("MONZO_USERNAME")?;
    let password = std::env::var("MONZO_PASSWORD")?;
    client.authenticate(&username, &password).await?;

    let accounts = client.accounts().list().await?;
    let account = accounts.first().expect("No accounts found");
    info!("using account {} ({})", account.id, account.description);

    let balance = client.accounts().balance(&account.id).await?;
    info!(
        "balance: {} {} (spent today: {})",
        balance.balance, balance.currency, balance.spend_today
    );

    // Last week's transactions with their merchants expanded
    let pagination = PaginationOptions::new()
        .limit(100)
        .since_time(OffsetDateTime::now_utc() - Duration::from_secs(7 * 24 * 60 * 60));
    let transactions = match client
        .transactions()
        .list(&account.id, Some(Expand::Merchant), Some(&pagination))
        .await
    {
        Err(e) if e.is_unauthorized() => {
            warn!("access token rejected, refreshing");
            client.refresh_access_token().await?;
            client
                .transactions()
                .list(&account.id, Some(Expand::Merchant), Some(&pagination))
                .await?
        }
        other => other?,
    };

    for tx in &transactions {
        let merchant = tx
            .merchant
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| tx.description.clone());
        info!("{} {:>8} {} {}", tx.created, tx.amount, tx.currency, merchant);
    }
    info!("found {} transactions", transactions.len());

    Ok(())
}
