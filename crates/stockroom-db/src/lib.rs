//! # stockroom-db: Database Layer for Stockroom
//!
//! SQLite storage for users, categories, suppliers, items and item/supplier
//! links, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (apps/web)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CategoryRepo  │    │ 001_initial_ │  │   │
//! │  │   │ Connection    │    │ SupplierRepo  │    │   schema.sql │  │   │
//! │  │   │ Management    │    │ ItemRepo      │    │              │  │   │
//! │  │   │               │    │ DashboardRepo │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DATABASE_PATH) or :memory: in tests                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./stockroom.db")).await?;
//! let item = db.items().get_by_owner(item_id, user_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Storage};

pub use repository::category::CategoryRepository;
pub use repository::dashboard::DashboardRepository;
pub use repository::item::ItemRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
