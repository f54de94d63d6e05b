//! Error type shared by every pool store.
//!
//! Provides structured error classification with a stable kind string and a
//! retryability hint for callers that want to wrap a store with their own
//! retry policy.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{ConfigError, StoreKind};
use crate::pool::DocumentError;
use crate::remote::RemoteError;

/// Errors that can occur during pool store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named pool does not exist.
    #[error("Pool '{pool}' was not found")]
    PoolNotFound { pool: String },

    /// The pool exists but has nothing left to lease.
    #[error("No pool members exist for '{pool}', please create some pool members")]
    EmptyPool { pool: String },

    /// The member to release or destroy does not exist.
    #[error("Pool member '{member}' was not found")]
    MemberNotFound { member: String },

    /// The leasing service is temporarily out of members for the pool.
    #[error("Pool '{pool}' does not have enough active pool members, please try later")]
    PoolMemberUnavailable { pool: String },

    /// The leasing service refused to destroy the member.
    #[error("Error destroying pool member '{member}': code {status}, message {body}")]
    PoolMemberNotDestroyed {
        member: String,
        status: u16,
        body: String,
    },

    #[error("Bad url: {url} ({reason})")]
    InvalidUrl { url: String, reason: String },

    #[error("Username or password are invalid")]
    InvalidCredentials,

    #[error("Unable to create token, got response code: {status}")]
    TokenNotCreated { status: u16 },

    /// The leasing service answered with a status this store does not handle.
    #[error("Unexpected response from {url}: code {status}, message {body}")]
    UnexpectedResponse {
        url: String,
        status: u16,
        body: String,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing document could not be decoded.
    #[error("Malformed pool document in {location}: {source}")]
    MalformedDocument {
        location: String,
        #[source]
        source: DocumentError,
    },

    #[error("Failed to serialize pool document: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Remote content error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("The {store} store does not support {operation}")]
    Unsupported {
        store: StoreKind,
        operation: &'static str,
    },
}

impl StoreError {
    /// Stable error kind for logs and callers.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::PoolNotFound { .. } => "pool_not_found",
            StoreError::EmptyPool { .. } => "pool_member_not_found",
            StoreError::MemberNotFound { .. } => "pool_member_not_found",
            StoreError::PoolMemberUnavailable { .. } => "pool_member_unavailable",
            StoreError::PoolMemberNotDestroyed { .. } => "pool_member_not_destroyed",
            StoreError::InvalidUrl { .. } => "invalid_url",
            StoreError::InvalidCredentials => "invalid_credentials",
            StoreError::TokenNotCreated { .. } => "token_not_created",
            StoreError::UnexpectedResponse { .. } => "unexpected_response",
            StoreError::Tls(_) => "tls_error",
            StoreError::Transport { .. } => "transport_error",
            StoreError::Io { .. } => "io_error",
            StoreError::MalformedDocument { .. } => "malformed_document",
            StoreError::Serialize(_) => "serialize_error",
            StoreError::Remote(_) => "remote_error",
            StoreError::Config(_) => "config_error",
            StoreError::Unsupported { .. } => "unsupported",
        }
    }

    /// Whether the same call may succeed later without any configuration change.
    ///
    /// Nothing in this crate retries; this only informs the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::EmptyPool { .. }
                | StoreError::PoolMemberUnavailable { .. }
                | StoreError::Transport { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
