//! Error types for Hush API operations.
//!
//! This module provides the single error hierarchy surfaced by the client: transport and
//! decoding failures, authentication failures, classified API errors, and polling outcomes.
//! Collaborators make every decision (idempotent deletes, retry policy) from one place by
//! matching on [`Error`] or calling its predicates.

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Main error type for Hush operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Network, DNS, TLS, or timeout failure talking to the API
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request body could not be encoded
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// Token endpoint answered successfully but returned an unusable token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-2xx response from the API
    #[error(transparent)]
    Api(ApiError),

    /// Acquiring a fresh token failed on the request path
    #[error("token refresh failed: {0}")]
    TokenRefresh(Box<Error>),

    /// The status fetch issued by the poller failed
    #[error("error polling status: {0}")]
    PollFetch(Box<Error>),

    /// Resource stayed in a transient status past the poll deadline
    #[error("timed out waiting for resource to reach a terminal status (current: {status})")]
    PollTimeout {
        /// Last status observed
        status: String,
    },

    /// Resource reached a terminal failure status
    #[error("resource entered {status} status: {detail}")]
    PollFailure {
        /// Terminal status reported by the backend
        status: String,
        /// Backend explanation
        detail: String,
    },

    /// Operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for Hush operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-checkable classification of an HTTP error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 404
    NotFound,
    /// 401
    Unauthorized,
    /// 400
    BadRequest,
    /// 422
    Validation,
    /// 409
    Conflict,
    /// 500
    Internal,
    /// Any other non-2xx status
    Unknown,
}

impl ApiErrorKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 => Self::Unauthorized,
            400 => Self::BadRequest,
            422 => Self::Validation,
            409 => Self::Conflict,
            500 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

/// A classified non-2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Request URL
    pub url: String,
    /// Request method
    pub method: String,
    /// HTTP status from the wire
    pub status: u16,
    /// Classification derived from `status`
    pub kind: ApiErrorKind,
    /// Short summary (problem title or canonical reason phrase)
    pub title: String,
    /// Diagnostic detail (problem detail or raw body)
    pub detail: String,
    /// Problem `type` URI, when the body carried one
    pub problem_type: Option<String>,
}

/// Structured problem document returned by the API on failure.
///
/// `status` in the body is ignored in favour of the wire status.
#[derive(Debug, Deserialize)]
struct ProblemDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    problem_type: Option<String>,
}

impl ApiError {
    /// Build an `ApiError` from a non-2xx response.
    ///
    /// The body is parsed as a problem document when possible; otherwise the raw text becomes
    /// the detail and the canonical reason phrase the title.
    #[must_use]
    pub fn from_response(method: &Method, url: &str, status: StatusCode, body: &[u8]) -> Self {
        let code = status.as_u16();
        let reason = status.canonical_reason().unwrap_or_default().to_string();

        match serde_json::from_slice::<ProblemDocument>(body) {
            Ok(problem) => Self {
                url: url.to_string(),
                method: method.to_string(),
                status: code,
                kind: ApiErrorKind::from_status(code),
                title: problem.title.unwrap_or_default(),
                detail: problem.detail.map(detail_text).unwrap_or_default(),
                problem_type: problem.problem_type,
            },
            Err(_) => Self {
                url: url.to_string(),
                method: method.to_string(),
                status: code,
                kind: ApiErrorKind::from_status(code),
                title: reason,
                detail: String::from_utf8_lossy(body).into_owned(),
                problem_type: None,
            },
        }
    }

    /// Returns true for 404 Not Found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }

    /// Returns true for 422 Unprocessable Entity.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.kind == ApiErrorKind::Validation
    }

    /// Returns true for 401 Unauthorized.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    /// Returns true for 409 Conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind == ApiErrorKind::Conflict
    }

    /// Returns true for 400 Bad Request.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        self.kind == ApiErrorKind::BadRequest
    }

    /// Returns true for 500 Internal Server Error.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.kind == ApiErrorKind::Internal
    }

    /// Returns true for any 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    fn message(&self) -> String {
        if !self.detail.is_empty() {
            return self.detail.clone();
        }
        if !self.title.is_empty() {
            return self.title.clone();
        }
        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string()
    }
}

// Validation errors sometimes carry a structured `detail` array.
fn detail_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} request to {} failed with status code {}: {}",
            self.method,
            self.url,
            self.status,
            self.message()
        )
    }
}

impl std::error::Error for ApiError {}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Api(err) => match err.kind {
                ApiErrorKind::NotFound => "NOT_FOUND",
                ApiErrorKind::Unauthorized => "UNAUTHORIZED",
                ApiErrorKind::BadRequest => "BAD_REQUEST",
                ApiErrorKind::Validation => "VALIDATION_ERROR",
                ApiErrorKind::Conflict => "CONFLICT",
                ApiErrorKind::Internal => "INTERNAL_ERROR",
                ApiErrorKind::Unknown => "API_ERROR",
            },
            Self::TokenRefresh(_) => "TOKEN_REFRESH_FAILED",
            Self::PollFetch(_) => "POLL_FETCH_FAILED",
            Self::PollTimeout { .. } => "POLL_TIMEOUT",
            Self::PollFailure { .. } => "POLL_FAILURE",
            Self::Cancelled => "CANCELLED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// The classified API error, looking through refresh and poll wrappers.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::TokenRefresh(inner) | Self::PollFetch(inner) => inner.api_error(),
            _ => None,
        }
    }

    /// Returns true if the API answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }

    /// Returns true if the API answered 422.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_validation_error)
    }

    /// Returns true if the API answered 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_unauthorized)
    }

    /// Returns true if the API answered 409.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_conflict)
    }

    /// Returns true if the API answered 400.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_bad_request)
    }

    /// Returns true if the API answered 500.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_internal)
    }

    /// Returns true if the failure is plausibly transient (transport or 5xx).
    ///
    /// This layer never acts on it; the hint is for collaborators' retry policies.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api(err) => err.is_server_error(),
            Self::TokenRefresh(inner) | Self::PollFetch(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}
