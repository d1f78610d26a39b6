use thiserror::Error;

/// Core error type for the Nodes graph engine
///
/// The store's mutators never return these; they are produced at the
/// validation boundary, by persistence collaborators and by snapshot import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Caller supplied an argument the store refuses (empty name, self-connection, ...)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// State store error
    #[error("State store error: {0}")]
    StateStoreError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Input/output error
    #[error("Input/output error: {0}")]
    IOError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Graph invariant violated (asymmetric or foreign connection)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::IOError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_error_display() {
        let errors = vec![
            (CoreError::ValidationError("empty name".to_string()), "Validation error: empty name"),
            (CoreError::NodeNotFound("n1".to_string()), "Node not found: n1"),
            (CoreError::StateStoreError("db_err".to_string()), "State store error: db_err"),
            (CoreError::SerializationError("ser_err".to_string()), "Serialization error: ser_err"),
            (CoreError::IOError("io_err".to_string()), "Input/output error: io_err"),
            (CoreError::ConfigurationError("config_err".to_string()), "Configuration error: config_err"),
            (CoreError::InvariantViolation("mirror".to_string()), "Invariant violation: mirror"),
            (CoreError::Other("other_err".to_string()), "other_err"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: CoreError = json_error.into();

        match error {
            CoreError::SerializationError(msg) => {
                assert!(msg.contains("expected value"));
            }
            _ => panic!("Expected SerializationError variant"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let error: CoreError = io_error.into();

        match error {
            CoreError::IOError(msg) => {
                assert!(msg.contains("file not found"));
            }
            _ => panic!("Expected IOError variant"),
        }
    }

    #[test]
    fn test_from_str() {
        let error: CoreError = "test error message".into();
        assert_eq!(error, CoreError::Other("test error message".to_string()));
    }
}
