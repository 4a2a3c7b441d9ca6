//! Service layer error types

use std::fmt;
use std::time::Duration;

use guild_core::{DomainError, ErrorCategory};
use validator::ValidationErrors;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Domain rule violation or repository failure
    Domain(DomainError),

    /// Request failed DTO validation
    Validation(String),

    /// An external collaborator did not answer in time
    Timeout {
        collaborator: &'static str,
        after: Duration,
    },

    /// Background unit failed to complete (panicked or was aborted)
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Timeout {
                collaborator,
                after,
            } => write!(f, "{collaborator} timed out after {}ms", after.as_millis()),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The wrapped domain error, if any
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => e.category(),
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Timeout { .. } | Self::Internal(_) => ErrorCategory::Upstream,
        }
    }

    /// Stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Timeout { .. } => "COLLABORATOR_TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status an API layer would map this error to
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::Authorization => 403,
            ErrorCategory::ResourceExhausted => 429,
            ErrorCategory::Validation => 400,
            ErrorCategory::Upstream => match self {
                Self::Timeout { .. } => 504,
                _ => 500,
            },
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
