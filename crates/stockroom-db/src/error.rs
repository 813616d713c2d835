//! Storage errors.
//!
//! Lookups return `Option`, so a missing row is usually not an error here.
//! Constraint failures get their own variants because the web layer answers
//! them with `400` instead of `500`.

use sqlx::error::ErrorKind;
use stockroom_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Raised only where absence cannot be an `Option`, e.g. a password
    /// change for a user deleted mid-request.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A referenced row is missing, or a still-referenced row was deleted.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Domain(CoreError),

    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let constraint = match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                // SQLite reports "UNIQUE constraint failed: table.column"
                ErrorKind::UniqueViolation => Some(DbError::UniqueViolation {
                    field: db_err
                        .message()
                        .rsplit(": ")
                        .next()
                        .unwrap_or("value")
                        .to_string(),
                    value: "unknown".to_string(),
                }),
                ErrorKind::ForeignKeyViolation => Some(DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                }),
                _ => None,
            },
            sqlx::Error::PoolClosed => {
                Some(DbError::ConnectionFailed("pool is closed".to_string()))
            }
            _ => None,
        };
        constraint.unwrap_or(DbError::Sqlx(err))
    }
}

impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => DbError::Invalid(v),
            other => DbError::Domain(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(DbError::not_found("Item", 42).to_string(), "Item not found: 42");

        let err = DbError::duplicate("users.username", "alice");
        assert!(err.is_unique_violation());
        assert_eq!(err.to_string(), "Duplicate users.username: 'alice' already exists");
    }

    #[test]
    fn test_row_not_found_stays_generic() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_validation_passes_through() {
        let err: DbError = CoreError::Validation(ValidationError::required("name")).into();
        assert!(matches!(err, DbError::Invalid(_)));
    }
}
