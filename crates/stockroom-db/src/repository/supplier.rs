//! # Supplier Repository
//!
//! Supplier names are unique. That index is what makes get-or-create safe
//! under concurrent item creation:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request A: create item, supplier "Acme"                               │
//! │  Request B: create item, supplier "Acme"      (same moment)            │
//! │                                                                         │
//! │  INSERT INTO suppliers (name, ..) VALUES ('Acme', ..)                   │
//! │      ON CONFLICT(name) DO NOTHING     ← loser inserts nothing          │
//! │  SELECT .. FROM suppliers WHERE name = 'Acme'   ← both see one row     │
//! │                                                                         │
//! │  Result: 1 supplier row, 2 link rows                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::search_pattern;
use stockroom_core::validation::{
    validate_name, validate_optional_text, DESCRIPTION_MAX_LEN, NAME_MAX_LEN,
};
use stockroom_core::{NewSupplier, Page, Supplier, SupplierUpdate};

const SUPPLIER_COLUMNS: &str = "supplier_id, name, contact_details, created_at";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a supplier.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the name is taken
    pub async fn create(&self, supplier: &NewSupplier) -> DbResult<Supplier> {
        validate_name("name", &supplier.name, NAME_MAX_LEN)?;
        validate_optional_text(
            "contact_details",
            supplier.contact_details.as_deref(),
            DESCRIPTION_MAX_LEN,
        )?;

        let name = supplier.name.trim();
        let sql = format!(
            r#"
            INSERT INTO suppliers (name, contact_details, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(name)
            .bind(supplier.contact_details.as_deref())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("supplier name", name),
                other => other,
            })
    }

    pub async fn get(&self, supplier_id: i64) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE supplier_id = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(supplier_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        find_by_name(&mut conn, name).await
    }

    /// Returns the supplier called `name`, creating it when absent.
    pub async fn get_or_create(&self, name: &str) -> DbResult<Supplier> {
        validate_name("supplier", name, NAME_MAX_LEN)?;
        let mut conn = self.pool.acquire().await?;
        upsert_named(&mut conn, name).await
    }

    /// Lists suppliers by id, optionally filtered by a name substring.
    pub async fn list(&self, page: Page, search: Option<&str>) -> DbResult<Vec<Supplier>> {
        let pattern = search_pattern(search);
        debug!(search = ?pattern, skip = page.skip, limit = page.limit, "Listing suppliers");

        let sql = format!(
            r#"
            SELECT {SUPPLIER_COLUMNS}
            FROM suppliers
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
            ORDER BY supplier_id
            LIMIT ?2 OFFSET ?3
            "#
        );
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(pattern)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    /// Applies the present fields of `update`.
    pub async fn update(
        &self,
        supplier_id: i64,
        update: &SupplierUpdate,
    ) -> DbResult<Option<Supplier>> {
        if let Some(name) = &update.name {
            validate_name("name", name, NAME_MAX_LEN)?;
        }
        let contact_details = update.contact_details.as_ref().and_then(|c| c.as_deref());
        validate_optional_text("contact_details", contact_details, DESCRIPTION_MAX_LEN)?;

        let sql = format!(
            r#"
            UPDATE suppliers
            SET name = COALESCE(?1, name),
                contact_details = CASE WHEN ?2 THEN ?3 ELSE contact_details END
            WHERE supplier_id = ?4
            RETURNING {SUPPLIER_COLUMNS}
            "#
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.contact_details.is_some())
            .bind(contact_details)
            .bind(supplier_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    /// Deletes a supplier together with its item links, in one transaction.
    pub async fn delete(&self, supplier_id: i64) -> DbResult<Option<Supplier>> {
        let mut tx = self.pool.begin().await?;

        let links = sqlx::query("DELETE FROM item_suppliers WHERE supplier_id = ?1")
            .bind(supplier_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let sql =
            format!("DELETE FROM suppliers WHERE supplier_id = ?1 RETURNING {SUPPLIER_COLUMNS}");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(supplier_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        if supplier.is_some() {
            info!(supplier_id, links_removed = links, "Supplier deleted");
        }
        Ok(supplier)
    }

    /// Suppliers linked to an item, in link order. Duplicated links repeat.
    pub async fn for_item(&self, item_id: i64) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT s.supplier_id, s.name, s.contact_details, s.created_at
            FROM item_suppliers l
            INNER JOIN suppliers s ON s.supplier_id = l.supplier_id
            WHERE l.item_id = ?1
            ORDER BY l.id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }
}

// =============================================================================
// Connection-level helpers (shared with ItemRepository transactions)
// =============================================================================

async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<Supplier>> {
    let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE name = ?1");
    let supplier = sqlx::query_as::<_, Supplier>(&sql)
        .bind(name.trim())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(supplier)
}

/// Atomic get-or-create on the unique supplier name.
pub(crate) async fn upsert_named(conn: &mut SqliteConnection, name: &str) -> DbResult<Supplier> {
    let name = name.trim();

    let inserted = sqlx::query(
        r#"
        INSERT INTO suppliers (name, contact_details, created_at)
        VALUES (?1, NULL, ?2)
        ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted > 0 {
        debug!(name = %name, "Supplier created on demand");
    }

    find_by_name(conn, name)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", name))
}

// =============================================================================
// Unit Tests
// =============================================================================
