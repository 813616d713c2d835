//! # Category Repository
//!
//! Categories are shared by every user. Names are not unique; lookups by
//! name return the oldest match.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::search_pattern;
use stockroom_core::validation::{
    validate_name, validate_optional_text, DESCRIPTION_MAX_LEN, NAME_MAX_LEN,
};
use stockroom_core::{Category, CategoryUpdate, NewCategory, Page};

const CATEGORY_COLUMNS: &str = "category_id, name, description, created_at";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn create(&self, category: &NewCategory) -> DbResult<Category> {
        validate_name("name", &category.name, NAME_MAX_LEN)?;
        validate_optional_text(
            "description",
            category.description.as_deref(),
            DESCRIPTION_MAX_LEN,
        )?;

        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, category.name.trim(), category.description.as_deref()).await
    }

    pub async fn get(&self, category_id: i64) -> DbResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE category_id = ?1");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    /// Exact name lookup.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let mut conn = self.pool.acquire().await?;
        find_by_name(&mut conn, name).await
    }

    /// Returns the category called `name`, creating it when absent.
    pub async fn get_or_create(&self, name: &str) -> DbResult<Category> {
        validate_name("category", name, NAME_MAX_LEN)?;
        let mut tx = self.pool.begin().await?;
        let category = find_or_create_named(&mut tx, name).await?;
        tx.commit().await?;
        Ok(category)
    }

    /// Lists categories by id, optionally filtered by a name substring.
    pub async fn list(&self, page: Page, search: Option<&str>) -> DbResult<Vec<Category>> {
        let pattern = search_pattern(search);
        debug!(search = ?pattern, skip = page.skip, limit = page.limit, "Listing categories");

        let sql = format!(
            r#"
            SELECT {CATEGORY_COLUMNS}
            FROM categories
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
            ORDER BY category_id
            LIMIT ?2 OFFSET ?3
            "#
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(pattern)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    /// Applies the present fields of `update`.
    pub async fn update(
        &self,
        category_id: i64,
        update: &CategoryUpdate,
    ) -> DbResult<Option<Category>> {
        if let Some(name) = &update.name {
            validate_name("name", name, NAME_MAX_LEN)?;
        }
        let description = update.description.as_ref().and_then(|d| d.as_deref());
        validate_optional_text("description", description, DESCRIPTION_MAX_LEN)?;

        let sql = format!(
            r#"
            UPDATE categories
            SET name = COALESCE(?1, name),
                description = CASE WHEN ?2 THEN ?3 ELSE description END
            WHERE category_id = ?4
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.description.is_some())
            .bind(description)
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    /// Deletes a category and returns the removed row.
    ///
    /// Fails with `ForeignKeyViolation` while items still reference it.
    pub async fn delete(&self, category_id: i64) -> DbResult<Option<Category>> {
        let sql =
            format!("DELETE FROM categories WHERE category_id = ?1 RETURNING {CATEGORY_COLUMNS}");
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }
}

// =============================================================================
// Connection-level helpers (shared with ItemRepository transactions)
// =============================================================================

async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
) -> DbResult<Category> {
    let sql = format!(
        r#"
        INSERT INTO categories (name, description, created_at)
        VALUES (?1, ?2, ?3)
        RETURNING {CATEGORY_COLUMNS}
        "#
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
    Ok(category)
}

async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<Category>> {
    let sql = format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1 ORDER BY category_id LIMIT 1"
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(name.trim())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(category)
}

/// Looks a category up by exact name and inserts it when missing.
pub(crate) async fn find_or_create_named(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Category> {
    if let Some(existing) = find_by_name(conn, name).await? {
        return Ok(existing);
    }
    debug!(name = %name.trim(), "Creating category on demand");
    insert(conn, name.trim(), None).await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use crate::DbError;

    fn named(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let db = memory_db().await;
        let repo = db.categories();

        let tools = repo.create(&named("Tools")).await.unwrap();
        assert_eq!(repo.get(tools.category_id).await.unwrap().unwrap(), tools);

        let updated = repo
            .update(
                tools.category_id,
                &CategoryUpdate {
                    description: Some(Some("Hand tools".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Tools");
        assert_eq!(updated.description.as_deref(), Some("Hand tools"));

        assert!(repo.update(999, &CategoryUpdate::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let db = memory_db().await;
        let err = db.categories().create(&named("  ")).await.unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_existing() {
        let db = memory_db().await;
        let repo = db.categories();

        let first = repo.get_or_create("Paint").await.unwrap();
        let second = repo.get_or_create("Paint").await.unwrap();
        assert_eq!(first.category_id, second.category_id);
        assert_eq!(repo.list(Page::default(), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let db = memory_db().await;
        let repo = db.categories();
        for name in ["Garden Tools", "Paint", "Power tools"] {
            repo.create(&named(name)).await.unwrap();
        }

        let found = repo.list(Page::default(), Some("TOOL")).await.unwrap();
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Garden Tools", "Power tools"]);

        assert!(repo.list(Page::default(), Some("%")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = memory_db().await;
        let repo = db.categories();
        let tools = repo.create(&named("Tools")).await.unwrap();

        assert_eq!(repo.delete(tools.category_id).await.unwrap().unwrap().name, "Tools");
        assert!(repo.get(tools.category_id).await.unwrap().is_none());
        assert!(repo.delete(tools.category_id).await.unwrap().is_none());
    }
}
