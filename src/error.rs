//! Error types for cooplock.
//!
//! Uses thiserror for derive macros. Contention and transient store failures
//! never reach this type from the retry loop; everything here is fatal.

use crate::exit_codes;
use crate::storage::StoreError;
use thiserror::Error;

/// Main error type for cooplock operations.
#[derive(Error, Debug)]
pub enum CoopLockError {
    /// Options file could not be read or holds invalid values.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied invalid input (empty or mixed-namespace resources).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The persisted lock records disagree with the request.
    #[error("Lock records are inconsistent: {0}")]
    Consistency(String),

    /// The local process identity could not be determined.
    #[error("Environment error: {0}")]
    Environment(String),

    /// The lock record set could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A store call failed outside of the retry loop.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CoopLockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoopLockError::Config(_) => exit_codes::CONFIG_ERROR,
            CoopLockError::Validation(_) => exit_codes::VALIDATION_FAILURE,
            CoopLockError::Consistency(_) => exit_codes::CONSISTENCY_FAILURE,
            CoopLockError::Serialization(_) => exit_codes::CONSISTENCY_FAILURE,
            CoopLockError::Environment(_) => exit_codes::ENVIRONMENT_FAILURE,
            CoopLockError::Storage(_) => exit_codes::STORAGE_FAILURE,
        }
    }
}

/// Result type alias for cooplock operations.
pub type Result<T> = std::result::Result<T, CoopLockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_has_correct_exit_code() {
        let err = CoopLockError::Validation("resources should not be empty".to_string());
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_FAILURE);
    }

    #[test]
    fn consistency_errors_share_exit_code() {
        let err = CoopLockError::Consistency("operation op-1 not found".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONSISTENCY_FAILURE);

        let err = CoopLockError::Serialization("bad float".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONSISTENCY_FAILURE);
    }

    #[test]
    fn environment_error_has_correct_exit_code() {
        let err = CoopLockError::Environment("no hostname".to_string());
        assert_eq!(err.exit_code(), exit_codes::ENVIRONMENT_FAILURE);
    }

    #[test]
    fn store_error_converts_into_storage_variant() {
        let err: CoopLockError = StoreError::NotFound("ns/_lock/all.lock".to_string()).into();
        assert!(matches!(err, CoopLockError::Storage(_)));
        assert_eq!(err.exit_code(), exit_codes::STORAGE_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = CoopLockError::Consistency("operation op-7 not found".to_string());
        assert_eq!(
            err.to_string(),
            "Lock records are inconsistent: operation op-7 not found"
        );

        let err = CoopLockError::Config("max_concurrent_operations must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: max_concurrent_operations must be greater than 0"
        );
    }
}
