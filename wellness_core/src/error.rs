//! Error types for the wellness_core library.

use serde::Serialize;
use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a bound text-generation capability.
///
/// Produced only by the safe-execution wrapper; it is a normal return value
/// and never escalates past the caller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("generation failed: {cause}")]
pub struct GenerationError {
    pub cause: String,
}

impl GenerationError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Core error type for wellness_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed numeric or categorical input, rejected before any generation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A check-in date that does not parse to a real calendar date
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    /// Not enough logged days for a history-based analysis
    #[error("Insufficient data: {have} day(s) logged, at least {need} required")]
    InsufficientData { have: usize, need: usize },

    /// Request kind is not registered (or has no bound generator)
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// The capability does not apply to this profile
    #[error("Not applicable: {0}")]
    NotApplicable(String),

    /// No profile stored under this id
    #[error("Profile not found: {0}")]
    ProfileNotFound(Uuid),

    /// The bound generator failed
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Machine-readable error category for the request surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    InsufficientData,
    UnknownCapability,
    NotApplicable,
    NotFound,
    Generation,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) | Error::InvalidDate(_) => ErrorKind::InvalidInput,
            Error::InsufficientData { .. } => ErrorKind::InsufficientData,
            Error::UnknownCapability(_) => ErrorKind::UnknownCapability,
            Error::NotApplicable(_) => ErrorKind::NotApplicable,
            Error::ProfileNotFound(_) => ErrorKind::NotFound,
            Error::Generation(_) => ErrorKind::Generation,
            Error::Io(_) | Error::Json(_) | Error::Csv(_) | Error::Toml(_) | Error::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Message suitable for showing to the person who made the request
    pub fn user_message(&self) -> String {
        match self {
            Error::Generation(e) => format!(
                "Sorry, the advisor could not produce a response right now. Cause: {}",
                e.cause
            ),
            Error::InsufficientData { have, need } => format!(
                "Need at least {} days of logs for this analysis ({} logged so far). \
                 Please log more days and try again.",
                need, have
            ),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_message_carries_cause() {
        let err = Error::from(GenerationError::new("connection reset"));
        assert_eq!(err.kind(), ErrorKind::Generation);
        let msg = err.user_message();
        assert!(msg.starts_with("Sorry"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_insufficient_data_asks_for_more_logs() {
        let err = Error::InsufficientData { have: 1, need: 2 };
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        assert!(err.user_message().contains("log more days"));
    }

    #[test]
    fn test_invalid_date_is_invalid_input() {
        assert_eq!(
            Error::InvalidDate("2024-02-30".into()).kind(),
            ErrorKind::InvalidInput
        );
    }
}
