//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.items().list(&filter)                                      │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── create(&self, new_item)      (one transaction)                    │
//! │  ├── get / get_by_owner(&self, id, ..)                                 │
//! │  ├── list(&self, filter)                                               │
//! │  ├── update(&self, id, partial)                                        │
//! │  └── delete(&self, id)            (one transaction)                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts
//! - [`CategoryRepository`](category::CategoryRepository) - Categories
//! - [`SupplierRepository`](supplier::SupplierRepository) - Suppliers and get-or-create
//! - [`ItemRepository`](item::ItemRepository) - Items and supplier links
//! - [`DashboardRepository`](dashboard::DashboardRepository) - Aggregates per owner
//!
//! ## Conventions
//! - Lookups return `Ok(None)` for a missing row
//! - Searches are case-insensitive substring matches (`LIKE … ESCAPE '\'`)
//! - Listings are ordered by primary key and paginated with [`Page`](stockroom_core::Page)

pub mod category;
pub mod dashboard;
pub mod item;
pub mod supplier;
pub mod user;

/// Builds a `LIKE` pattern matching `term` anywhere, with `%`, `_` and `\`
/// in the term matched literally. Pair with `ESCAPE '\'`.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trimmed, non-empty search term as a `LIKE` pattern.
pub(crate) fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(contains_pattern)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use stockroom_core::{NewUser, Role, User};

    use crate::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn user(db: &Database, username: &str) -> User {
        db.users()
            .create(&NewUser {
                username: username.to_string(),
                password_hash: format!("hash-{username}-{}", Utc::now().timestamp()),
                role: Role::Regular,
            })
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("wid"), "%wid%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert_eq!(search_pattern(Some("  ")), None);
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some(" gad ")).as_deref(), Some("%gad%"));
    }
}
