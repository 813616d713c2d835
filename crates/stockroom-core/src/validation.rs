//! # Validation Module
//!
//! Input validation for every write path.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extraction (serde)                                      │
//! │  ├── Types, required fields, Money precision                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Lengths, non-negative quantity and price, currency codes          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL, UNIQUE(username), UNIQUE(supplier name)                 │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_username, validate_quantity};
//!
//! assert!(validate_username("alice").is_ok());
//! assert!(validate_quantity(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CategoryRef, ItemUpdate, NewItem};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;
pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 255;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a username: non-blank, at most 50 characters.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_name("username", username, USERNAME_MAX_LEN)
}

/// Validates a plaintext password before hashing.
///
/// ## Rules
/// - At least 8 characters
/// - At most 100 characters
///
/// Leading/trailing whitespace is significant and not trimmed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();
    if len == 0 {
        return Err(ValidationError::required("password"));
    }
    if len < PASSWORD_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: PASSWORD_MIN_LEN,
        });
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: PASSWORD_MAX_LEN,
        });
    }
    Ok(())
}

/// Validates a required display name (item, category, supplier).
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates an optional free-text field. `None` always passes.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates and normalizes an ISO 4217 currency code.
///
/// ```rust
/// use stockroom_core::validation::normalize_currency_code;
///
/// assert_eq!(normalize_currency_code(" usd ").unwrap(), "USD");
/// assert!(normalize_currency_code("dollars").is_err());
/// ```
pub fn normalize_currency_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "expected a 3-letter currency code".to_string(),
        });
    }
    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Stock quantities may be zero but never negative.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates an item insert payload.
pub fn validate_new_item(item: &NewItem) -> ValidationResult<()> {
    validate_name("name", &item.name, NAME_MAX_LEN)?;
    validate_optional_text("description", item.description.as_deref(), DESCRIPTION_MAX_LEN)?;
    validate_quantity(item.quantity)?;
    validate_price(item.price)?;

    if let CategoryRef::Name(name) = &item.category {
        validate_name("category", name, NAME_MAX_LEN)?;
    }
    validate_optional_text("supplier", item.supplier.as_deref(), NAME_MAX_LEN)?;
    Ok(())
}

/// Validates the present fields of a partial item update.
pub fn validate_item_update(update: &ItemUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name, NAME_MAX_LEN)?;
    }
    validate_optional_text(
        "description",
        update.description.as_ref().and_then(|d| d.as_deref()),
        DESCRIPTION_MAX_LEN,
    )?;
    if let Some(quantity) = update.quantity {
        validate_quantity(quantity)?;
    }
    if let Some(price) = update.price {
        validate_price(price)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
