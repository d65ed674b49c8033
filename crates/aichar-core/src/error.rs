//! Error types for the aichar workspace.

use thiserror::Error;

/// Result type alias using aichar's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for aichar operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The record source could not be loaded; fatal to initialization.
    #[error("Load error: {0}")]
    Load(String),

    /// The dataset manifest is missing or malformed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A render pass stage failed
    #[error("Render error: {0}")]
    Render(String),

    /// The scheduler task is gone or refused a command
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_load() {
        let err = Error::Load("data/manifest.json unreadable".to_string());
        assert_eq!(err.to_string(), "Load error: data/manifest.json unreadable");
    }

    #[test]
    fn test_error_display_manifest() {
        let err = Error::Manifest("missing work_types".to_string());
        assert_eq!(err.to_string(), "Manifest error: missing work_types");
    }

    #[test]
    fn test_error_display_render() {
        let err = Error::Render("stage panicked".to_string());
        assert_eq!(err.to_string(), "Render error: stage panicked");
    }

    #[test]
    fn test_error_display_scheduler() {
        let err = Error::Scheduler("driver stopped".to_string());
        assert_eq!(err.to_string(), "Scheduler error: driver stopped");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("unknown category 'maybe'".to_string());
        assert_eq!(err.to_string(), "Invalid input: unknown category 'maybe'");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
