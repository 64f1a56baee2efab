//! Error types for the Turnstile service.

use thiserror::Error;

/// Main error type for Turnstile operations.
///
/// Admission decisions are never errors; a rejected request is reported
/// through [`Admission`](crate::ratelimit::Admission).
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Configuration is structurally valid but unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration could not be read or deserialized
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// I/O errors, including failures to bind or serve
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;
