//! Unified error type for the market proxy.
//!
//! Every variant carries owned strings so the type is `Clone`: a single
//! in-flight upstream fetch hands the same result to all of its waiters.

use serde::Serialize;
use thiserror::Error;

/// Retry hint returned to clients when the upstream keeps rate limiting us.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Upstream API error (status={status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("All {0} endpoints failed")]
    Exhausted(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}

/// JSON body of an error response: `{ error, details?, retryAfter? }`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Status code, optional `Retry-After` header value, and body for a failed lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub retry_after_secs: Option<u64>,
    pub body: ErrorBody,
}

impl Error {
    /// HTTP status a client should see for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingParameter(_) | Error::InvalidParameter(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::NotFound(_) => 404,
            Error::Upstream { status: 404, .. } => 404,
            Error::RateLimited { .. } => 429,
            _ => 500,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// Map the error onto the client-facing response contract.
    pub fn to_response(&self) -> ErrorResponse {
        let status = self.status_code();
        match self {
            Error::RateLimited { retry_after_ms } => {
                let secs = retry_after_ms
                    .div_ceil(1000)
                    .max(DEFAULT_RETRY_AFTER_SECS);
                ErrorResponse {
                    status,
                    retry_after_secs: Some(secs),
                    body: ErrorBody {
                        error: "Rate limit exceeded. Please try again in a few moments.".into(),
                        details: None,
                        retry_after: Some(secs),
                    },
                }
            }
            Error::Unauthorized(message) => ErrorResponse {
                status,
                retry_after_secs: None,
                body: ErrorBody {
                    error: "Invalid API key for Financial Modeling Prep".into(),
                    details: Some(message.clone()),
                    retry_after: None,
                },
            },
            Error::MissingParameter(message)
            | Error::InvalidParameter(message)
            | Error::NotFound(message) => ErrorResponse {
                status,
                retry_after_secs: None,
                body: ErrorBody {
                    error: message.clone(),
                    details: None,
                    retry_after: None,
                },
            },
            Error::Upstream { status: 404, message } => ErrorResponse {
                status,
                retry_after_secs: None,
                body: ErrorBody {
                    error: "Symbol not found on FMP".into(),
                    details: Some(message.clone()),
                    retry_after: None,
                },
            },
            Error::Config(message) => ErrorResponse {
                status,
                retry_after_secs: None,
                body: ErrorBody {
                    error: "Server configuration error".into(),
                    details: Some(message.clone()),
                    retry_after: None,
                },
            },
            other => ErrorResponse {
                status,
                retry_after_secs: None,
                body: ErrorBody {
                    error: "Failed to fetch data from FMP API".into(),
                    details: Some(other.to_string()),
                    retry_after: None,
                },
            },
        }
    }
}
