//! # User Repository
//!
//! Account storage. Hashing happens before anything reaches this module:
//! the repository only ever sees PHC strings.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{NewUser, Page, Role, User};

const USER_COLUMNS: &str = "user_id, username, password, role, created_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username already taken
    pub async fn create(&self, user: &NewUser) -> DbResult<User> {
        debug!(username = %user.username, role = %user.role, "Creating user");

        let sql = format!(
            r#"
            INSERT INTO users (username, password, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("username", &user.username),
                other => other,
            })
    }

    pub async fn get(&self, user_id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Exact, case-sensitive username lookup.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self, page: Page) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id LIMIT ?1 OFFSET ?2");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn update_role(&self, user_id: i64, role: Role) -> DbResult<Option<User>> {
        let sql = format!("UPDATE users SET role = ?1 WHERE user_id = ?2 RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Replaces the stored password hash.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - the user no longer exists
    pub async fn update_password(&self, user_id: i64, password_hash: &str) -> DbResult<User> {
        let sql =
            format!("UPDATE users SET password = ?1 WHERE user_id = ?2 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(password_hash)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))
    }

    /// Deletes a user and returns the removed row.
    ///
    /// Fails with `ForeignKeyViolation` while the user still owns items.
    pub async fn delete(&self, user_id: i64) -> DbResult<Option<User>> {
        let sql = format!("DELETE FROM users WHERE user_id = ?1 RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
