//! Domain errors.
//!
//! `ValidationError` covers bad user input and always maps to a client error
//! further up (`DbError::Invalid`, then `400` in the web layer). `CoreError`
//! adds the failures of parsing and arithmetic on domain values.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Price text that is not a fixed-point decimal with at most two places.
    #[error("Invalid price '{input}': {reason}")]
    InvalidPrice { input: String, reason: String },

    #[error("Converted amount out of range")]
    ConversionOverflow,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// A field that failed a validation rule. `field` is the user-facing name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must not be negative")]
    Negative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}
