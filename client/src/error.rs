use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const OPP_ERROR: &str = "OPP_ERROR";
pub const AUTH_ERROR: &str = "AUTH_ERROR";
pub const VALIDATION: &str = "VALIDATION";
pub const TIMEOUT: &str = "TIMEOUT";

/// Error body the server sends with every non-2xx response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Transport-level failure talking to the server.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {}", body.message)]
    Api { status: StatusCode, body: ApiErrorBody },
    #[error("change feed: {0}")]
    Stream(String),
    #[error("malformed change event: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            BackendError::Http(err) => err.status(),
            _ => None,
        }
    }
}

/// What callers of the store and session see: `{code, message, details}`.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{code}: {message}")]
pub struct ClientError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl ClientError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(VALIDATION, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TIMEOUT, message)
    }

    /// Wraps a backend failure under `code`, keeping the server's own error
    /// body as details when there is one.
    pub fn from_backend(code: &'static str, err: BackendError) -> Self {
        let details = match &err {
            BackendError::Api { status, body } => Some(serde_json::json!({
                "status": status.as_u16(),
                "code": body.code,
                "details": body.details,
            })),
            _ => None,
        };
        Self {
            code,
            message: err.to_string(),
            details,
        }
    }
}
