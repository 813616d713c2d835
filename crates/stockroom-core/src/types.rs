//! # Domain Types
//!
//! Records persisted by stockroom-db and the payloads used to create or
//! change them.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   User ──1:N──► InventoryItem ◄──N:1── Category                        │
//! │                       │                                                 │
//! │                       │ 1:N                                             │
//! │                       ▼                                                 │
//! │                 ItemSupplier ──N:1──► Supplier (unique name)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ID Strategy
//! Integer surrogate keys assigned by SQLite (`INTEGER PRIMARY KEY`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Role
// =============================================================================

/// Access level of a user account.
///
/// Stored as lowercase text. Parsing is case-insensitive so that forms posting
/// `"Admin"` or `"Regular"` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Regular,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Regular => "regular",
        }
    }

    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Regular]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "regular" => Ok(Role::Regular),
            _ => Err(CoreError::UnknownRole(s.to_string())),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account.
///
/// `password` holds an argon2 PHC string (or the unusable sentinel) and is
/// never serialized.
#[derive(Debug, Clone, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Insert payload for a user. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update: only `Some` fields change. `description: Some(None)`
/// clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub supplier_id: i64,
    pub name: String,
    pub contact_details: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact_details: Option<String>,
}

/// Partial update: only `Some` fields change. `contact_details: Some(None)`
/// clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplierUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub contact_details: Option<Option<String>>,
}

// =============================================================================
// Inventory Item
// =============================================================================

/// A stocked item.
///
/// `created_at` is set once; `updated_at` is refreshed on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryItem {
    pub item_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    #[ts(as = "String")]
    pub price: Money,
    pub category_id: i64,
    pub created_by: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// How a new item names its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRef {
    /// An existing category id.
    Id(i64),
    /// A category name, created when no category has it yet.
    Name(String),
}

/// Insert payload for an item.
///
/// A non-blank `supplier` is resolved with get-or-create on the supplier name
/// and linked to the new item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Money,
    pub category: CategoryRef,
    pub supplier: Option<String>,
    pub created_by: i64,
}

/// Partial update: only `Some` fields change. `description: Some(None)`
/// clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Link row between an item and a supplier. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ItemSupplier {
    pub id: i64,
    pub item_id: i64,
    pub supplier_id: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Field that may be absent, `null`, or a value. Paired with
/// `#[serde(default)]`, absent stays `None` and `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Listing
// =============================================================================

/// Offset pagination shared by every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    /// Clamps raw query values: `skip >= 0`, `1 <= limit <= MAX_PAGE_SIZE`.
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        Page {
            skip: skip.unwrap_or(0).max(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// 1-based page number at the default page size.
    pub fn numbered(page: i64) -> Self {
        let page = page.max(1);
        Page {
            skip: (page - 1).saturating_mul(DEFAULT_PAGE_SIZE),
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

/// Filters for listing items.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub page: Page,
    /// Case-insensitive substring match on the item name.
    pub search: Option<String>,
    pub category_id: Option<i64>,
    /// Restrict to items created by this user.
    pub owner_id: Option<i64>,
}

impl ItemFilter {
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// =============================================================================
// Dashboard Input
// =============================================================================

/// One item as seen by the dashboard: the item, its category name and the
/// name of its first linked supplier.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockRow {
    pub item_id: i64,
    pub name: String,
    pub quantity: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub price: Money,
    pub category_name: Option<String>,
    pub supplier_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" regular ".parse::<Role>().unwrap(), Role::Regular);
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Regular).unwrap(), "\"regular\"");
    }

    #[test]
    fn test_user_never_serializes_password() {
        let user = User {
            user_id: 1,
            username: "alice".to_string(),
            password: "$argon2id$secret".to_string(),
            role: Role::Regular,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_page_clamps() {
        assert_eq!(Page::new(None, None), Page { skip: 0, limit: 10 });
        assert_eq!(Page::new(Some(-5), Some(1000)), Page { skip: 0, limit: 100 });
        assert_eq!(Page::new(Some(20), Some(0)).limit, 1);
        assert_eq!(Page::numbered(3), Page { skip: 20, limit: 10 });
        assert_eq!(Page::numbered(0).skip, 0);
    }

    #[test]
    fn test_huge_page_number_saturates() {
        let page = Page::numbered(i64::MAX);
        assert_eq!(page.skip, i64::MAX);
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_item_update_parses_partial_json() {
        let update: ItemUpdate = serde_json::from_str(r#"{"quantity": 7}"#).unwrap();
        assert_eq!(update.quantity, Some(7));
        assert!(update.name.is_none());
        assert!(update.description.is_none());
    }

    #[test]
    fn test_explicit_null_is_kept_apart_from_absent() {
        let cleared: ItemUpdate = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: ItemUpdate = serde_json::from_str(r#"{"description": "oak"}"#).unwrap();
        assert_eq!(set.description, Some(Some("oak".to_string())));

        let supplier: SupplierUpdate =
            serde_json::from_str(r#"{"contact_details": null}"#).unwrap();
        assert_eq!(supplier.contact_details, Some(None));
        let category: CategoryUpdate = serde_json::from_str(r#"{"name": "Garden"}"#).unwrap();
        assert_eq!(category.description, None);
    }

    #[test]
    fn test_search_term_ignores_blank() {
        let filter = ItemFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), None);
    }
}
