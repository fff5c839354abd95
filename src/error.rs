//! Error and Status Types
//!
//! `ApiError` is what service calls return; `Outcome` is what stores hand
//! back to views. Stores never propagate `ApiError` directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application status carried in response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Error")]
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    /// Error reported by the server in a `{status: "Error"}` body
    #[error("{0}")]
    Server(String),
    #[error("json error: {0}")]
    Serde(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("no authenticated session")]
    Unauthenticated,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Serde(e.to_string())
    }
}

/// Result of a store action as seen by a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Validation failure or an error reported by the server
    Error(String),
    /// Transport or decoding failure
    Exception(String),
    /// Another load or save is in flight on the same store
    Busy,
    /// The editing context was cleared before the call finished
    Cancelled,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    pub fn status(&self) -> Status {
        if self.is_ok() {
            Status::Ok
        } else {
            Status::Error
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Ok => None,
            Outcome::Error(msg) | Outcome::Exception(msg) => Some(msg.clone()),
            Outcome::Busy => Some("another request is in progress".to_string()),
            Outcome::Cancelled => Some("request cancelled".to_string()),
        }
    }

    /// Uniform `{status, error}` pair
    pub fn as_response(&self) -> StatusResponse {
        StatusResponse {
            status: self.status(),
            error: self.message(),
        }
    }
}

impl From<ApiError> for Outcome {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Server(_) | ApiError::Http { .. } | ApiError::Validation(_) => {
                Outcome::Error(e.to_string())
            }
            ApiError::Unauthenticated => Outcome::Error(e.to_string()),
            ApiError::Transport(_) | ApiError::Serde(_) => Outcome::Exception(e.to_string()),
            ApiError::Cancelled => Outcome::Cancelled,
        }
    }
}

/// `{status, error}` body, also the shape of server error envelopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
