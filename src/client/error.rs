use std::fmt;

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// A non-2xx answer from the API, kept as the server sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub status: StatusCode,
    /// The `message` (or `error`) field of a JSON error body, if any.
    pub server_message: Option<String>,
    pub body: Option<Value>,
}

impl Rejection {
    pub fn new(status: StatusCode, body: &[u8]) -> Self {
        let body: Option<Value> = serde_json::from_slice(body).ok();
        let server_message = body.as_ref().and_then(|b| {
            ["message", "error"]
                .iter()
                .find_map(|key| b.get(key).and_then(Value::as_str))
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        });
        Rejection {
            status,
            server_message,
            body,
        }
    }

    /// The server message, or the status' reason phrase when there is none.
    pub fn message(&self) -> String {
        match &self.server_message {
            Some(m) => m.clone(),
            None => self
                .status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request went out but no response came back.
    #[error("no response from {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with an error status. Includes a 401 that could
    /// not be recovered by a refresh (e.g. the replay was rejected too).
    #[error("request rejected with {0}")]
    Rejected(Rejection),
    /// A 401 whose refresh failed. The session has been cleared; the
    /// original rejection is kept.
    #[error("session expired, please sign in again ({0})")]
    SessionExpired(Rejection),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    Request(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        self.rejection().map(|r| r.status)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ApiError::Rejected(r) | ApiError::SessionExpired(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}
