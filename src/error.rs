use std::collections::HashMap;
use std::fmt;

use miette::Diagnostic;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_error::SpanTrace;

/// The error body returned by the Monzo API alongside a non-success status.
///
/// Every field is optional: the API is not consistent about which ones it fills
/// in, and OAuth failures use `error`/`error_description` where resource
/// endpoints use `code`/`message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self
            .code
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or("unknown");
        let message = self
            .message
            .as_deref()
            .or(self.error_description.as_deref())
            .unwrap_or("no message");
        write!(f, "Monzo API Error ({code}): {message}")
    }
}

/// A non-success response from the API host.
#[derive(Debug)]
pub struct ApiError {
    pub status_code: StatusCode,
    /// The parsed error message when the body could be parsed, otherwise the raw body.
    pub message: String,
    pub body: String,
    pub response: Option<ErrorResponse>,
    pub span_trace: SpanTrace,
}

impl ApiError {
    /// Translates a non-success status and its body into an `ApiError`.
    ///
    /// The body is parsed as an [`ErrorResponse`] on a best-effort basis; when it is not
    /// JSON, or not shaped like an error, the raw text becomes the message.
    #[must_use]
    pub fn from_response(status_code: StatusCode, body: String) -> Self {
        let response = serde_json::from_str::<ErrorResponse>(&body).ok();
        let message = response
            .as_ref()
            .and_then(|r| r.message.clone().or_else(|| r.error_description.clone()))
            .unwrap_or_else(|| body.clone());

        Self {
            status_code,
            message,
            body,
            response,
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code, self.message)
    }
}

/// Errors that can occur when interacting with the Monzo API.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Network level failure (timeout, connection reset, DNS, TLS) surfaced from `reqwest`.
    #[error("error making request: {0:?}")]
    #[diagnostic(
        code(monzo_rs::request_error),
        help("Check your network connection and Monzo API availability")
    )]
    Request(#[source] reqwest::Error),

    /// A required parameter was missing or empty. Raised before any request is made.
    #[error("invalid argument `{name}`: {reason}")]
    #[diagnostic(
        code(monzo_rs::invalid_argument),
        help("Provide a non-empty value for `{name}`")
    )]
    InvalidArgument { name: &'static str, reason: String },

    /// An authenticated call was attempted before any access token was obtained.
    #[error("client has no access token")]
    #[diagnostic(
        code(monzo_rs::unauthenticated),
        help("Authenticate, exchange an authorization code or set an access token first")
    )]
    Unauthenticated,

    /// A required environment variable was not set.
    #[error("environment variable {0} is not set")]
    #[diagnostic(
        code(monzo_rs::missing_env_var),
        help("Export {0} before creating the client from the environment")
    )]
    MissingEnvVar(&'static str),

    #[error("error decoding response: {0:?}")]
    #[diagnostic(
        code(monzo_rs::deserialization_error),
        help("The API returned data in an unexpected format")
    )]
    DeserializationError(#[source] serde_json::Error, Option<String>),

    #[error("endpoint could not be parsed as a URL")]
    #[diagnostic(
        code(monzo_rs::invalid_endpoint),
        help("Check that the API base URL is correctly formatted")
    )]
    InvalidEndpoint,

    /// The API host answered with a non-success status.
    #[error("api error: {0}")]
    #[diagnostic(
        code(monzo_rs::api_error),
        help("Inspect the parsed error response; a 401 usually means the access token must be refreshed")
    )]
    Api(Box<ApiError>),

    /// The direct-to-storage upload of an attachment answered with a non-success status.
    #[error("attachment upload failed with {status_code}: {body}")]
    #[diagnostic(
        code(monzo_rs::upload_failed),
        help("The pre-signed upload URL may have expired; request a new one and retry the upload")
    )]
    UploadFailed {
        status_code: StatusCode,
        body: String,
        span_trace: SpanTrace,
    },
}

impl Error {
    pub(crate) fn invalid_argument(name: &'static str) -> Self {
        Self::InvalidArgument {
            name,
            reason: "parameter is required".to_string(),
        }
    }

    pub(crate) fn upload_failed(status_code: StatusCode, body: String) -> Self {
        Self::UploadFailed {
            status_code,
            body,
            span_trace: SpanTrace::capture(),
        }
    }

    /// The HTTP status code returned by the remote, if this error came from a response.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Api(api) => Some(api.status_code),
            Self::UploadFailed { status_code, .. } => Some(*status_code),
            Self::Request(e) => e.status(),
            _ => None,
        }
    }

    /// The parsed error body, if the API returned one that could be parsed.
    #[must_use]
    pub fn api_response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Api(api) => api.response.as_ref(),
            _ => None,
        }
    }

    /// The raw response body, if there was one.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Api(api) => Some(api.body.as_str()),
            Self::UploadFailed { body, .. } => Some(body.as_str()),
            Self::DeserializationError(_, body) => body.as_deref(),
            _ => None,
        }
    }

    /// The span trace captured where the error was created.
    #[must_use]
    pub fn span_trace(&self) -> Option<&SpanTrace> {
        match self {
            Self::Api(api) => Some(&api.span_trace),
            Self::UploadFailed { span_trace, .. } => Some(span_trace),
            _ => None,
        }
    }

    /// Whether the API rejected the access token. Callers typically refresh and retry.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::DeserializationError(e, None)
    }
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        Self::Api(Box::new(e))
    }
}

/// Type alias for results from this crate.
///
/// This is already a Miette diagnostic result due to the implementation of
/// the Diagnostic trait for the Error type.
pub type Result<O> = std::result::Result<O, Error>;

/// Fails with [`Error::InvalidArgument`] when `value` is empty.
pub(crate) fn require(name: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::invalid_argument(name))
    } else {
        Ok(())
    }
}
