//! Error types for contentflow.
//!
//! Stage agents never surface these to the orchestrator: they are converted
//! into fallback values at the stage boundary. The HTTP layer and the binary
//! are the only places that render them to users.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// The main error type for contentflow operations.
#[derive(Debug, Error)]
pub enum ContentflowError {
    /// A request failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A model, image or search provider failed.
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// The content store rejected or failed a write.
    #[error("{0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration was missing or invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The worker pool refused a job.
    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Field-level validation failures for an incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[error("Validation failed: {}", self.summary())]
pub struct ValidationError {
    /// Field name to message.
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationError {
    /// Creates an empty validation error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for a field. The first message for a field wins.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
        self
    }

    /// Records a failure in place.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Returns true if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }

    fn summary(&self) -> String {
        self.field_errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Errors raised by the language model, image and search providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure, including timeouts.
    #[error("{provider} request failed: {message}")]
    Transport {
        /// The provider name.
        provider: &'static str,
        /// Description of the failure.
        message: String,
        /// Whether the failure was a timeout.
        timed_out: bool,
    },

    /// The provider answered with a non-success status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Status {
        /// The provider name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Error body or message.
        message: String,
    },

    /// The provider answered with a body we could not use.
    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse {
        /// The provider name.
        provider: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// The provider client could not be configured.
    #[error("provider configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Creates a transport error from a `reqwest` failure.
    #[must_use]
    pub fn transport(provider: &'static str, err: &reqwest::Error) -> Self {
        Self::Transport {
            provider,
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(provider: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if the failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timed_out: true, .. })
    }
}

/// Errors raised by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The owning user is not registered.
    #[error("User not found: {email}")]
    UserNotFound {
        /// The email that was looked up.
        email: String,
    },

    /// No content exists with the given id.
    #[error("Generated content not found: {id}")]
    ContentNotFound {
        /// The content id.
        id: i64,
    },

    /// The backing storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PersistenceError {
    /// Creates a user not found error.
    #[must_use]
    pub fn user_not_found(email: impl Into<String>) -> Self {
        Self::UserNotFound {
            email: email.into(),
        }
    }
}

/// Error raised when configuration is missing or invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid configuration for '{key}': {message}")]
pub struct ConfigError {
    /// The configuration key.
    pub key: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a required key that was not set.
    #[must_use]
    pub fn missing(key: impl Into<String>) -> Self {
        Self::new(key, "value is required")
    }
}

/// Errors raised when handing work to the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The pool has been shut down and accepts no more jobs.
    #[error("worker pool is shut down")]
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validation_error_keeps_first_message_per_field() {
        let err = ValidationError::new()
            .with_field("topic", "Topic is required")
            .with_field("topic", "ignored")
            .with_field("platform", "Platform must be twitter, linkedin, instagram, or blog");

        assert_eq!(err.field_errors.len(), 2);
        assert_eq!(err.field_errors["topic"], "Topic is required");
        assert!(err.to_string().starts_with("Validation failed: platform:"));
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::status("openai", 429, "rate limited");
        assert_eq!(err.to_string(), "openai returned HTTP 429: rate limited");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_persistence_error_converts_into_umbrella() {
        let err: ContentflowError = PersistenceError::user_not_found("a@b.c").into();
        assert_eq!(err.to_string(), "User not found: a@b.c");
    }

    #[test]
    fn test_config_error_missing() {
        let err = ConfigError::missing("openai.api_key");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'openai.api_key': value is required"
        );
    }
}
