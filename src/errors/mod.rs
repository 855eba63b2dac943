//! # Error Handling
//!
//! Error types for authentication, secret resolution and configuration composition.
//!
//! A missing secret is not an error: reads report it as `Ok(None)` and the composer
//! turns it into an empty property source. Backends without a matching factory are
//! logged and skipped rather than surfaced here.

use thiserror::Error;

/// Result type for vault-config operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while authenticating, reading secrets or composing configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Login or renewal rejected by the secret store.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Required parameter missing or invalid. Raised before any network call.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Network or timeout failure talking to the secret store.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The secret store answered with an unexpected status.
    #[error("Secret store returned {status} for '{path}': {message}")]
    Backend { path: String, status: u16, message: String },

    /// Validation of user-supplied input failed.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (token files, identity documents).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into() }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into(), source: None }
    }

    /// Create a backend status error.
    pub fn backend(path: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Backend { path: path.into(), status, message: message.into() }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether this error aborts a configuration load under fail-fast policy.
    ///
    /// Configuration and validation errors are always fatal. Authentication,
    /// transport and backend failures are fatal only when fail-fast is enabled;
    /// that decision is left to the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Validation { .. } | Self::Internal { .. })
    }

    /// Whether the store rejected our credentials.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request to secret store timed out".to_string()
        } else if error.is_connect() {
            "cannot connect to secret store".to_string()
        } else {
            error.to_string()
        };
        Self::Transport { message, source: Some(error) }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Configuration { message: errors.to_string() }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Configuration { message: format!("invalid YAML configuration: {}", error) }
    }
}
