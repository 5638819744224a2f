//! Sentry integration for monzo-rs errors.
//!
//! Only available when the `sentry` feature is enabled.
//!
//! ```toml
//! [dependencies]
//! monzo-rs = { version = "0.1", features = ["sentry"] }
//! ```
//!
//! Span traces are only captured when the subscriber includes
//! `tracing_error::ErrorLayer`:
//!
//! ```ignore
//! use tracing_subscriber::prelude::*;
//! use tracing_error::ErrorLayer;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(ErrorLayer::default())
//!     .with(sentry::integrations::tracing::layer())
//!     .init();
//! ```

use std::collections::BTreeMap;

use sentry_core::{Breadcrumb, protocol::Value};

use crate::error::Error;

const MAX_BODY_PREVIEW: usize = 500;

/// Convert a monzo-rs Error into a Sentry breadcrumb.
impl<'a> From<&'a Error> for Breadcrumb {
    fn from(error: &'a Error) -> Self {
        let (category, message, data) = match error {
            Error::Request(source) => (
                "http.request",
                format!("HTTP request error: {source}"),
                BTreeMap::new(),
            ),

            Error::DeserializationError(source, _) => (
                "http.response",
                format!("Failed to deserialize response: {source}"),
                BTreeMap::new(),
            ),

            Error::Api(api) => {
                let mut data = BTreeMap::new();
                data.insert(
                    "status_code".to_string(),
                    Value::from(api.status_code.as_u16()),
                );
                let code = api
                    .response
                    .as_ref()
                    .and_then(|r| r.code.as_deref().or(r.error.as_deref()))
                    .unwrap_or("unknown");
                data.insert("code".to_string(), Value::from(code));
                ("monzo.api", format!("Monzo API error: {code}"), data)
            }

            Error::UploadFailed { status_code, .. } => {
                let mut data = BTreeMap::new();
                data.insert("status_code".to_string(), Value::from(status_code.as_u16()));
                (
                    "monzo.attachment",
                    "Attachment upload failed".to_string(),
                    data,
                )
            }

            Error::InvalidArgument { name, .. } => {
                let mut data = BTreeMap::new();
                data.insert("argument".to_string(), Value::from(*name));
                (
                    "monzo.validation",
                    format!("Invalid argument: {name}"),
                    data,
                )
            }

            Error::Unauthenticated => (
                "auth",
                "No access token".to_string(),
                BTreeMap::new(),
            ),

            Error::MissingEnvVar(name) => (
                "monzo.config",
                format!("Missing environment variable {name}"),
                BTreeMap::new(),
            ),

            Error::InvalidEndpoint => (
                "monzo.config",
                "Invalid endpoint URL".to_string(),
                BTreeMap::new(),
            ),
        };

        Breadcrumb {
            ty: "error".to_string(),
            category: Some(category.to_string()),
            message: Some(message),
            data,
            level: sentry_core::Level::Error,
            ..Default::default()
        }
    }
}

/// Convert a monzo-rs Error into Sentry context data.
///
/// ```ignore
/// use sentry::configure_scope;
/// use monzo_rs::sentry_integration::error_to_sentry_context;
///
/// if let Err(e) = client.accounts().list().await {
///     configure_scope(|scope| {
///         for (key, value) in error_to_sentry_context(&e) {
///             scope.set_extra(&key, value);
///         }
///     });
/// }
/// ```
pub fn error_to_sentry_context(error: &Error) -> BTreeMap<String, Value> {
    let mut context = BTreeMap::new();

    if let Some(span_trace) = error.span_trace() {
        context.insert(
            "monzo.span_trace".to_string(),
            Value::from(format!("{span_trace}")),
        );
    }

    if let Some(status) = error.status_code() {
        context.insert("monzo.status_code".to_string(), Value::from(status.as_u16()));
    }

    if let Some(body) = error.response_body() {
        let truncated = if body.chars().count() > MAX_BODY_PREVIEW {
            format!("{}...", body.chars().take(MAX_BODY_PREVIEW).collect::<String>())
        } else {
            body.to_string()
        };
        context.insert("monzo.response_body".to_string(), Value::from(truncated));
    }

    if let Some(response) = error.api_response() {
        if let Some(code) = &response.code {
            context.insert("monzo.code".to_string(), Value::from(code.clone()));
        }
        if let Some(msg) = &response.message {
            context.insert("monzo.message".to_string(), Value::from(msg.clone()));
        }
    }

    context
}
