//! Unified error handling for the user store.
//!
//! Provides a single error type surfaced by every store operation. Absent
//! records are not errors: operations return `Option`/`bool` for those, and
//! `NotFound` exists for callers that want to treat absence as a failure.

use domain::DomainError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    // Storage
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::NotFound => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::StorageUnavailable(_) | AppError::Timeout(_) | AppError::Conflict(_)
        )
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::InvalidArgument(msg),
            DomainError::Password(msg) => AppError::InvalidArgument(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

// =============================================================================
// Storage Error Conversion (MongoDB)
// =============================================================================

/// Server error code for a unique index violation.
#[cfg(feature = "database")]
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Field named in a duplicate key message such as
/// `E11000 duplicate key error ... dup key: { CustomerNumber: 1 }`.
#[cfg(feature = "database")]
fn duplicate_key_field(message: &str) -> Option<String> {
    let (_, rest) = message.split_once("dup key: {")?;
    let (field, _) = rest.split_once(':')?;
    let field = field.trim().trim_matches('"');
    (!field.is_empty()).then(|| field.to_string())
}

// Logged by callers, which know the operation
#[cfg(feature = "database")]
impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE =>
            {
                let field = duplicate_key_field(&write_error.message)
                    .unwrap_or_else(|| "Document".to_string());
                AppError::Conflict(field)
            }
            _ => AppError::StorageUnavailable(err.to_string()),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn storage_unavailable(msg: impl Into<String>) -> Self {
        AppError::StorageUnavailable(msg.into())
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        AppError::Timeout(operation.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
