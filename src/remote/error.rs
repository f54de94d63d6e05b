//! Errors of the remote content API adapter.
//!
//! Response errors are formatted here, from the raw status and body, so the
//! message never depends on how a particular client library renders them.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The requested object does not exist (HTTP 404).
    #[error("Not found. Request URI: {uri}")]
    NotFound { uri: String },

    /// Any other non-success response.
    #[error("Server responded with code {status}, message: {message}. Request URI: {uri}")]
    Response {
        status: u16,
        message: String,
        uri: String,
    },

    #[error("Request to {uri} failed: {source}")]
    Transport {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response body from {uri}: {reason}")]
    Decode { uri: String, reason: String },

    #[error("Remote client misconfigured: {0}")]
    Setup(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }

    /// Build the error for a non-success response.
    pub fn from_response(status: u16, body: &str, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if status == 404 {
            return RemoteError::NotFound { uri };
        }
        RemoteError::Response {
            status,
            message: error_message(body),
            uri,
        }
    }
}

/// Extract a human readable message from an error body.
///
/// Prefers the JSON `message` field, then `error`, then the raw body.
/// Structured messages (`{"name": ["has already been taken"]}`) are flattened.
pub fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = parsed.as_ref().and_then(|v| {
        v.get("message")
            .filter(|m| !m.is_null())
            .or_else(|| v.get("error").filter(|m| !m.is_null()))
    });

    match field {
        Some(value) => flatten(value),
        None => body.trim().to_string(),
    }
}

fn flatten(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{} {}", k, flatten(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
