/*!
 * Error types for the lexidrill application.
 *
 * This module contains custom error types for the storage boundary and learner input,
 * using the thiserror crate for ergonomic error definitions. The application shell
 * reports through anyhow.
 */

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors produced at the word repository boundary.
///
/// Every storage failure is classified into one of these variants before it
/// leaves the repository, so callers branch on a typed outcome instead of
/// inspecting driver error codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Storage could not be reached or did not answer in time
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A uniqueness constraint rejected an insert
    #[error("Duplicate entry")]
    Duplicate,

    /// The learner being created already exists
    #[error("Learner already exists")]
    Conflict,

    /// Any other constraint (foreign key, not null, check) rejected a write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Unexpected failure such as a malformed query or a row mapping error
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Whether the failure is transient and the same request may succeed later
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, message) => {
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                match failure.code {
                    ErrorCode::ConstraintViolation => match failure.extended_code {
                        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Self::Duplicate,
                        _ => Self::ConstraintViolation(detail),
                    },
                    ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::OutOfMemory
                    | ErrorCode::DiskFull
                    | ErrorCode::FileLockingProtocolFailed => Self::StorageUnavailable(detail),
                    _ => Self::Internal(detail),
                }
            }
            _ => Self::Internal(error.to_string()),
        }
    }
}

/// Reasons a learner-supplied word is refused before it reaches storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidWord {
    /// Nothing left after trimming whitespace
    #[error("word is empty")]
    Empty,

    /// Longer than the configured maximum, counted in characters
    #[error("word is longer than {max} characters")]
    TooLong {
        /// Maximum accepted length
        max: usize,
    },
}
