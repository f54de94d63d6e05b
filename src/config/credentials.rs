//! Secret handling for passwords and API tokens.
//!
//! Secrets are held in memory only and never show up in logs.

use std::env;

use serde::{Deserialize, Deserializer};

/// Wrapper for sensitive strings that prevents accidental logging.
///
/// The inner value is never exposed via Debug or Display traits.
/// Use `expose()` to access the actual value when needed for API calls.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureString(String);

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the inner value.
    ///
    /// Use sparingly and only when actually sending to APIs.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(••••••••)")
    }
}

impl std::fmt::Display for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "••••••••")
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecureString)
    }
}

/// Resolve a secret from an explicit value, falling back to an environment
/// variable. Empty values count as unset.
pub fn resolve_secret(explicit: Option<&SecureString>, env_var: &str) -> Option<SecureString> {
    if let Some(value) = explicit.filter(|v| !v.is_empty()) {
        return Some(value.clone());
    }
    env::var(env_var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecureString::new)
}
