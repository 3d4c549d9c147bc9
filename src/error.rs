//! Error types for Boerse.

use thiserror::Error;

use crate::posting::FieldError;

/// Common error type for Boerse.
#[derive(Error, Debug)]
pub enum BoerseError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),

    /// A notification mail could not be composed or delivered.
    #[error("notification error: {0}")]
    Notification(String),

    /// No posting exists for the given id.
    #[error("{0} not found")]
    NotFound(String),

    /// The supplied capability token does not match.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Field-level validation failed; carries every violation in form order.
    #[error("validation failed ({} field error(s))", .0.len())]
    Validation(Vec<FieldError>),

    /// The sender address matches the deny-list.
    #[error("rejected submission")]
    DenyListed,

    /// Invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for BoerseError {
    fn from(e: sqlx::Error) -> Self {
        BoerseError::Database(e.to_string())
    }
}

/// Result type alias for Boerse operations.
pub type Result<T> = std::result::Result<T, BoerseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let err = BoerseError::NotFound("posting".to_string());
        assert_eq!(err.to_string(), "posting not found");
    }

    #[test]
    fn test_forbidden_error_display() {
        let err = BoerseError::Forbidden("invalid admin token".to_string());
        assert_eq!(err.to_string(), "forbidden: invalid admin token");
    }

    #[test]
    fn test_validation_error_display() {
        let err = BoerseError::Validation(vec![
            FieldError::new("title", "Ein Titel ist erforderlich."),
            FieldError::new("text", "Eine Beschreibung ist erforderlich."),
        ]);
        assert_eq!(err.to_string(), "validation failed (2 field error(s))");
    }

    #[test]
    fn test_deny_listed_display_is_generic() {
        assert_eq!(BoerseError::DenyListed.to_string(), "rejected submission");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BoerseError = io_err.into();
        assert!(matches!(err, BoerseError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: BoerseError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, BoerseError::Database(_)));
    }
}
