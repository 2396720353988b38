// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::port::ExecutionError;

    #[test]
    fn test_error_conversions() {
        let err: AppError = DomainError::DuplicateProbeId("sip".to_string()).into();
        assert_eq!(err.to_string(), "Domain error: Duplicate probe id: sip");

        let err: AppError = ExecutionError::Timeout(8000).into();
        assert_eq!(err.to_string(), "Execution error: timed out after 8000ms");
    }

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }
}
