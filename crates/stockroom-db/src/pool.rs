//! # Database Handle
//!
//! Opens the SQLite store behind Stockroom and hands out repositories.
//!
//! ```text
//!   DbConfig ──► Database::new ──► SqlitePool ──► migrations
//!                                       │
//!          ┌──────────┬──────────┬──────┴─────┬────────────┐
//!          ▼          ▼          ▼            ▼            ▼
//!       users()  categories() suppliers()   items()   dashboard()
//! ```
//!
//! Two storage locations exist. A file database runs in WAL mode with a small
//! pool. An in-memory database lives only as long as its connection, so its
//! pool is pinned to one connection that never expires.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::category::CategoryRepository;
use crate::repository::dashboard::DashboardRepository;
use crate::repository::item::ItemRepository;
use crate::repository::supplier::SupplierRepository;
use crate::repository::user::UserRepository;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    File(PathBuf),
    Memory,
}

impl Storage {
    fn connect_options(&self) -> SqliteConnectOptions {
        let options = match self {
            Storage::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            Storage::Memory => SqliteConnectOptions::new().in_memory(true),
        };
        options.synchronous(SqliteSynchronous::Normal).foreign_keys(true)
    }

    fn describe(&self) -> String {
        match self {
            Storage::File(path) => path.display().to_string(),
            Storage::Memory => MEMORY_PATH.to_string(),
        }
    }
}

/// Pool and startup settings for [`Database::new`].
///
/// ```rust,ignore
/// let config = DbConfig::new("./stockroom.db").max_connections(8);
/// let db = Database::new(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
    /// `None` keeps idle connections open forever.
    pub idle_timeout: Option<Duration>,
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed configuration. The path `:memory:` yields
    /// [`DbConfig::in_memory`] instead, since a multi-connection pool over
    /// `:memory:` would give each connection its own empty database.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.as_os_str() == MEMORY_PATH {
            return DbConfig::in_memory();
        }
        DbConfig {
            storage: Storage::File(path.to_path_buf()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    /// Private in-memory database, used by tests and `DATABASE_PATH=:memory:`.
    pub fn in_memory() -> Self {
        DbConfig {
            storage: Storage::Memory,
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.storage == Storage::Memory
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout);
        match self.storage {
            Storage::Memory => options.max_lifetime(None),
            Storage::File(_) => options,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared database handle. Clones share one pool, so the handle goes straight
/// into the HTTP application state.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let location = config.storage.describe();
        info!(path = %location, "Opening database");

        let pool = config
            .pool_options()
            .connect_with(config.storage.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{location}: {e}")))?;
        debug!(
            max = config.max_connections,
            min = config.min_connections,
            "Connection pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations; a no-op when the schema is current.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool access for ad-hoc queries in tests and tooling.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    /// Item access. Ownership checks go through
    /// [`ItemRepository::get_by_owner`] or an owner filter on `list`.
    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    pub fn dashboard(&self) -> DashboardRepository {
        DashboardRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// `true` when a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_closed_database_fails_health_check() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/stockroom-test.db")
            .max_connections(10)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert!(!config.run_migrations);
        assert_eq!(config.storage, Storage::File(PathBuf::from("/tmp/stockroom-test.db")));
    }

    #[test]
    fn test_memory_path_maps_to_single_connection() {
        let memory = DbConfig::new(":memory:");
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
        assert!(memory.idle_timeout.is_none());
    }
}
