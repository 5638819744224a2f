#[macro_use]
extern crate tracing;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use warp::Filter;
use monzo_rs::{Client, Config};

const REDIRECT_URI: &str = "http://localhost:4000/redirect";

lazy_static::lazy_static! {
    static ref REDIRECT_ARGS: Arc<Mutex<Option<RedirectArgs>>> = Arc::new(Mutex::new(None));
}

#[derive(Clone, Deserialize)]
struct RedirectArgs {
    code: String,
    state: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Spawn a local web server to handle the OAuth callback
    std::thread::spawn(|| {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let redirect = warp::get()
                .and(warp::path("redirect"))
                .and(warp::query::<RedirectArgs>())
                .map(|args: RedirectArgs| {
                    tokio::spawn(async move {
                        *REDIRECT_ARGS.lock().await = Some(args);
                    });
                    warp::reply::html("success")
                });
            warp::serve(redirect).run(([127, 0, 0, 1], 4000)).await
        });
    });

    let client = Client::new(Config::from_env()?)?;
    let authorization = client
        .authorization()
        .expect("credentials are loaded from the environment");

    // The state is echoed back on the redirect and must be compared by the caller
    let state = format!("{:x}", OffsetDateTime::now_utc().unix_timestamp_nanos());
    info!(
        "Sign in to Monzo: {}",
        authorization.authorize_url(Some(&state), Some(REDIRECT_URI))
    );

    info!("Waiting for redirect URL to be hit...");
    let RedirectArgs {
        code,
        state: returned_state,
    } = loop {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if let Some(args) = REDIRECT_ARGS.try_lock().ok().and_then(|c| c.clone()) {
            break args;
        }
    };
    assert_eq!(returned_state.as_deref(), Some(state.as_str()));

    client.authenticate_with_code(&code, REDIRECT_URI).await?;

    let accounts = client.accounts().list().await?;
    info!("found accounts: {:#?}", accounts);

    Ok(())
}
