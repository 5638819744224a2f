//! # monzo-rs
//!
//! A Rust client library for the Monzo API.
//!
//! ```no_run
//! # async fn run() -> monzo_rs::error::Result<()> {
//! use monzo_rs::{Client, Config, KeyPair};
//!
//! let key_pair = KeyPair::new("oauthclient_...".to_string(), "secret".to_string());
//! let client = Client::new(Config::new(key_pair))?;
//! client.authenticate("user@example.com", "password").await?;
//!
//! for account in client.accounts().list().await? {
//!     let balance = client.accounts().balance(&account.id).await?;
//!     println!("{}: {} {}", account.description, balance.balance, balance.currency);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Access tokens are never refreshed behind the caller's back. A call made with a stale
//! token fails with an error for which [`Error::is_unauthorized`] is true; call
//! [`Client::refresh_access_token`] and retry.
//!
//! ## Sentry Integration
//!
//! Errors carry a [`SpanTrace`] captured where they were created. With the `sentry`
//! feature enabled, errors also convert into Sentry breadcrumbs; see
//! [`sentry_integration`](crate::sentry_integration).

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod config;
pub mod endpoints;
pub mod entities;
pub mod error;
pub mod oauth;
pub mod pagination;
pub mod utils;

#[cfg(feature = "sentry")]
pub mod sentry_integration;

pub use client::Client;
pub use config::Config;
pub use endpoints::MonzoEndpoint;
pub use entities::*;
pub use error::{ApiError, Error, ErrorResponse};
pub use oauth::{AccessToken, AuthorizationClient, KeyPair};
pub use pagination::PaginationOptions;

// Re-export SpanTrace for users who want to access it
pub use tracing_error::SpanTrace;
