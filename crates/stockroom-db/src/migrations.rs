//! Schema migrations, embedded at compile time from `migrations/sqlite/`.
//!
//! Files are named `NNN_description.sql` and applied in order, each in its own
//! transaction; sqlx records them in `_sqlx_migrations`. Applied files are
//! checksummed, so schema changes always go in a new file.
//!
//! | File | Tables |
//! |------|--------|
//! | `001_initial_schema.sql` | users, categories, suppliers, inventory_items, item_suppliers |

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool).await?;
    if applied >= total {
        debug!(applied, "Schema is current");
        return Ok(());
    }

    MIGRATOR.run(pool).await?;
    info!(pending = total - applied, total, "Applied schema migrations");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.iter().count();

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;
    if !table_exists {
        return Ok((embedded, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;
    Ok((embedded, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();

        let (embedded, applied) = migration_status(db.pool()).await.unwrap();
        assert!(embedded > 0);
        assert_eq!(embedded, applied);
    }

    #[tokio::test]
    async fn test_fresh_database_reports_nothing_applied() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false)).await.unwrap();
        let (embedded, applied) = migration_status(db.pool()).await.unwrap();
        assert!(embedded > 0);
        assert_eq!(applied, 0);
    }
}
