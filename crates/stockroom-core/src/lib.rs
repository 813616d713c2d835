//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! Everything in this crate is a pure function or a plain data type. The
//! database and HTTP layers depend on it, never the other way around.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/web (axum)                              │   │
//! │  │    /auth/*  /items  /categories  /suppliers  /inventory/*      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ dashboard │  │ validation│  │   │
//! │  │   │ User,Item │  │   Money   │  │ aggregates│  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (User, Category, Supplier, InventoryItem) and payloads
//! - [`money`] - Fixed-point price type stored as integer cents
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`dashboard`] - Inventory aggregates for the dashboard views
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price: Money = "9.99".parse().unwrap();
//! assert_eq!(price.cents(), 999);
//! assert_eq!(price.multiply_quantity(3).to_string(), "29.97");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dashboard;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when a listing request does not carry `limit`.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for `limit` on every listing.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Items with a quantity strictly below this are "low stock".
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Currency prices are stored in.
pub const BASE_CURRENCY: &str = "CAD";

/// Password column value for accounts that can only sign in through an
/// external identity provider.
///
/// It is not a valid PHC string, so password verification always fails.
pub const UNUSABLE_PASSWORD: &str = "!unusable";
