//! # Item Repository
//!
//! Inventory items and their supplier links.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── CategoryRef::Id(id)     → use id (FK checked by SQLite)          │
//! │    ├── CategoryRef::Name(name) → find by name, insert when missing      │
//! │    │                                                                    │
//! │    ├── INSERT inventory_items                                           │
//! │    │                                                                    │
//! │    └── supplier name present?                                           │
//! │          ├── upsert supplier by unique name                             │
//! │          └── INSERT item_suppliers link                                 │
//! │  COMMIT                       (any failure rolls everything back)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::{category, search_pattern, supplier};
use stockroom_core::validation::{
    validate_item_update, validate_name, validate_new_item, NAME_MAX_LEN,
};
use stockroom_core::{
    CategoryRef, InventoryItem, ItemFilter, ItemSupplier, ItemUpdate, NewItem, Supplier,
};

const ITEM_COLUMNS: &str = "item_id, name, description, quantity, price_cents, \
                            category_id, created_by, created_at, updated_at";

/// Repository for inventory item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
///
/// let mine = repo.list(&ItemFilter { owner_id: Some(user.user_id), ..Default::default() }).await?;
/// let item = repo.get_by_owner(item_id, user.user_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Creates an item, resolving its category and supplier in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - `category_id` or `created_by`
    ///   does not reference an existing row
    /// * `Err(DbError::Invalid)` - payload failed validation
    pub async fn create(&self, item: &NewItem) -> DbResult<InventoryItem> {
        validate_new_item(item)?;

        let mut tx = self.pool.begin().await?;

        let category_id = match &item.category {
            CategoryRef::Id(id) => *id,
            CategoryRef::Name(name) => {
                category::find_or_create_named(&mut tx, name)
                    .await?
                    .category_id
            }
        };

        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO inventory_items
                (name, description, quantity, price_cents, category_id,
                 created_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(item.name.trim())
            .bind(item.description.as_deref())
            .bind(item.quantity)
            .bind(item.price)
            .bind(category_id)
            .bind(item.created_by)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let supplier_name = item
            .supplier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(name) = supplier_name {
            let supplier = supplier::upsert_named(&mut tx, name).await?;
            insert_link(&mut tx, created.item_id, supplier.supplier_id).await?;
        }

        tx.commit().await?;

        info!(
            item_id = created.item_id,
            created_by = created.created_by,
            category_id,
            supplier = ?supplier_name,
            "Item created"
        );
        Ok(created)
    }

    pub async fn get(&self, item_id: i64) -> DbResult<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE item_id = ?1");
        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Owner-scoped lookup: `None` unless `owner_id` created the item.
    pub async fn get_by_owner(
        &self,
        item_id: i64,
        owner_id: i64,
    ) -> DbResult<Option<InventoryItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE item_id = ?1 AND created_by = ?2"
        );
        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(item_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Lists items ordered by id.
    ///
    /// Every filter is optional; `search` matches anywhere in the name,
    /// ignoring ASCII case.
    pub async fn list(&self, filter: &ItemFilter) -> DbResult<Vec<InventoryItem>> {
        let start = Instant::now();
        let pattern = search_pattern(filter.search_term());

        let sql = format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM inventory_items
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR category_id = ?2)
              AND (?3 IS NULL OR created_by = ?3)
            ORDER BY item_id
            LIMIT ?4 OFFSET ?5
            "#
        );
        let items = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(pattern)
            .bind(filter.category_id)
            .bind(filter.owner_id)
            .bind(filter.page.limit)
            .bind(filter.page.skip)
            .fetch_all(&self.pool)
            .await?;

        debug!(
            count = items.len(),
            skip = filter.page.skip,
            limit = filter.page.limit,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Listed items"
        );
        Ok(items)
    }

    /// Applies the present fields of `update` and refreshes `updated_at`.
    ///
    /// Ownership is not checked here; callers resolve the item with
    /// [`get_by_owner`](Self::get_by_owner) first when it matters.
    pub async fn update(
        &self,
        item_id: i64,
        update: &ItemUpdate,
    ) -> DbResult<Option<InventoryItem>> {
        validate_item_update(update)?;

        let sql = format!(
            r#"
            UPDATE inventory_items
            SET name = COALESCE(?1, name),
                description = CASE WHEN ?2 THEN ?3 ELSE description END,
                quantity = COALESCE(?4, quantity),
                price_cents = COALESCE(?5, price_cents),
                category_id = COALESCE(?6, category_id),
                updated_at = ?7
            WHERE item_id = ?8
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.description.is_some())
            .bind(update.description.as_ref().and_then(|d| d.as_deref()))
            .bind(update.quantity)
            .bind(update.price)
            .bind(update.category_id)
            .bind(Utc::now())
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        if item.is_some() {
            debug!(item_id, "Item updated");
        }
        Ok(item)
    }

    /// Deletes an item and its supplier links in one transaction.
    pub async fn delete(&self, item_id: i64) -> DbResult<Option<InventoryItem>> {
        let mut tx = self.pool.begin().await?;

        let links = sqlx::query("DELETE FROM item_suppliers WHERE item_id = ?1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let sql =
            format!("DELETE FROM inventory_items WHERE item_id = ?1 RETURNING {ITEM_COLUMNS}");
        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        if item.is_some() {
            info!(item_id, links_removed = links, "Item deleted");
        }
        Ok(item)
    }

    /// Links an existing item to the supplier called `supplier_name`,
    /// creating the supplier when absent.
    pub async fn add_supplier(&self, item_id: i64, supplier_name: &str) -> DbResult<ItemSupplier> {
        validate_name("supplier", supplier_name, NAME_MAX_LEN)?;

        let mut tx = self.pool.begin().await?;
        let supplier = supplier::upsert_named(&mut tx, supplier_name).await?;
        let link = insert_link(&mut tx, item_id, supplier.supplier_id).await?;
        tx.commit().await?;
        Ok(link)
    }

    /// Link rows of an item, oldest first.
    pub async fn links(&self, item_id: i64) -> DbResult<Vec<ItemSupplier>> {
        let links = sqlx::query_as::<_, ItemSupplier>(
            r#"
            SELECT id, item_id, supplier_id, created_at
            FROM item_suppliers
            WHERE item_id = ?1
            ORDER BY id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    /// Suppliers linked to an item, oldest link first.
    pub async fn suppliers_for(&self, item_id: i64) -> DbResult<Vec<Supplier>> {
        supplier::SupplierRepository::new(self.pool.clone()).for_item(item_id).await
    }

    /// Counts items, optionally for a single owner.
    pub async fn count(&self, owner_id: Option<i64>) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_items WHERE (?1 IS NULL OR created_by = ?1)",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

async fn insert_link(
    conn: &mut SqliteConnection,
    item_id: i64,
    supplier_id: i64,
) -> DbResult<ItemSupplier> {
    let link = sqlx::query_as::<_, ItemSupplier>(
        r#"
        INSERT INTO item_suppliers (item_id, supplier_id, created_at)
        VALUES (?1, ?2, ?3)
        RETURNING id, item_id, supplier_id, created_at
        "#,
    )
    .bind(item_id)
    .bind(supplier_id)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    Ok(link)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, user};
    use crate::{Database, DbConfig, DbError};
    use stockroom_core::{Money, Page};

    fn widget(owner: i64, category: CategoryRef) -> NewItem {
        NewItem {
            name: "Widget".to_string(),
            description: Some("Blue widget".to_string()),
            quantity: 5,
            price: Money::from_cents(999),
            category,
            supplier: None,
            created_by: owner,
        }
    }

    async fn tools(db: &Database) -> i64 {
        db.categories().get_or_create("Tools").await.unwrap().category_id
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let category_id = tools(&db).await;

        let created = db
            .items()
            .create(&widget(alice.user_id, CategoryRef::Id(category_id)))
            .await
            .unwrap();
        let fetched = db.items().get(created.item_id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Widget");
        assert_eq!(fetched.description.as_deref(), Some("Blue widget"));
        assert_eq!(fetched.quantity, 5);
        assert_eq!(fetched.price, Money::from_cents(999));
        assert_eq!(fetched.category_id, category_id);
        assert_eq!(fetched.created_by, alice.user_id);
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn test_create_by_category_name_creates_category_once() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;

        let first = db
            .items()
            .create(&widget(alice.user_id, CategoryRef::Name("Tools".to_string())))
            .await
            .unwrap();
        let second = db
            .items()
            .create(&widget(alice.user_id, CategoryRef::Name("Tools".to_string())))
            .await
            .unwrap();

        assert_eq!(first.category_id, second.category_id);
        let category = db.categories().get(first.category_id).await.unwrap().unwrap();
        assert_eq!(category.name, "Tools");
    }

    #[tokio::test]
    async fn test_create_with_missing_references_fails() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;

        let err = db
            .items()
            .create(&widget(alice.user_id, CategoryRef::Id(999)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let category_id = tools(&db).await;
        let err = db
            .items()
            .create(&widget(999, CategoryRef::Id(category_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(db.items().count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_shared_supplier_name_creates_one_supplier_two_links() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let category_id = tools(&db).await;

        let mut first = widget(alice.user_id, CategoryRef::Id(category_id));
        first.supplier = Some("Acme".to_string());
        let mut second = first.clone();
        second.name = "Gadget".to_string();
        second.supplier = Some("  Acme ".to_string());

        let repo = db.items();
        let a = repo.create(&first).await.unwrap();
        let b = repo.create(&second).await.unwrap();

        let suppliers = db.suppliers().list(Page::default(), None).await.unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].name, "Acme");

        let links_a = repo.links(a.item_id).await.unwrap();
        let links_b = repo.links(b.item_id).await.unwrap();
        assert_eq!(links_a.len(), 1);
        assert_eq!(links_b.len(), 1);
        assert_eq!(links_a[0].supplier_id, suppliers[0].supplier_id);
        assert_eq!(links_b[0].supplier_id, suppliers[0].supplier_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_share_one_supplier() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("stockroom.db")).max_connections(4))
            .await
            .unwrap();
        let alice = user(&db, "alice").await;
        let category_id = tools(&db).await;

        let tasks: Vec<_> = (0..8)
            .map(|n| {
                let repo = db.items();
                let mut item = widget(alice.user_id, CategoryRef::Id(category_id));
                item.name = format!("Widget {n}");
                item.supplier = Some("Acme".to_string());
                tokio::spawn(async move { repo.create(&item).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let suppliers = db.suppliers().list(Page::default(), None).await.unwrap();
        assert_eq!(suppliers.len(), 1);
        let links: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM item_suppliers WHERE supplier_id = ?1")
                .bind(suppliers[0].supplier_id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(links, 8);
        db.close().await;
    }

    #[tokio::test]
    async fn test_blank_supplier_is_ignored() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let mut item = widget(alice.user_id, CategoryRef::Id(tools(&db).await));
        item.supplier = Some("   ".to_string());

        let created = db.items().create(&item).await.unwrap();
        assert!(db.items().links(created.item_id).await.unwrap().is_empty());
        assert!(db.suppliers().list(Page::default(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_update_changes_only_given_fields() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let created = db
            .items()
            .create(&widget(alice.user_id, CategoryRef::Id(tools(&db).await)))
            .await
            .unwrap();

        let update = ItemUpdate {
            quantity: Some(42),
            ..Default::default()
        };
        let updated = db.items().update(created.item_id, &update).await.unwrap().unwrap();

        assert_eq!(updated.quantity, 42);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.price, created.price);
        assert_eq!(updated.category_id, created.category_id);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        assert!(db.items().update(999, &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_null_description_clears_column() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let created = db
            .items()
            .create(&widget(alice.user_id, CategoryRef::Id(tools(&db).await)))
            .await
            .unwrap();

        let update = ItemUpdate {
            description: Some(None),
            ..Default::default()
        };
        let cleared = db.items().update(created.item_id, &update).await.unwrap().unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.name, created.name);

        let untouched = db
            .items()
            .update(created.item_id, &ItemUpdate::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.description, None);
    }

    #[tokio::test]
    async fn test_negative_quantity_update_is_rejected() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let created = db
            .items()
            .create(&widget(alice.user_id, CategoryRef::Id(tools(&db).await)))
            .await
            .unwrap();

        let update = ItemUpdate {
            quantity: Some(-1),
            ..Default::default()
        };
        let err = db.items().update(created.item_id, &update).await.unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_get_by_owner_hides_other_users_items() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let bob = user(&db, "bob").await;
        let created = db
            .items()
            .create(&widget(alice.user_id, CategoryRef::Id(tools(&db).await)))
            .await
            .unwrap();

        let repo = db.items();
        assert!(repo.get_by_owner(created.item_id, alice.user_id).await.unwrap().is_some());
        assert!(repo.get_by_owner(created.item_id, bob.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pagination_pages_are_disjoint() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let category_id = tools(&db).await;

        for i in 0..15 {
            let mut item = widget(alice.user_id, CategoryRef::Id(category_id));
            item.name = format!("Widget {i}");
            db.items().create(&item).await.unwrap();
        }

        let repo = db.items();
        let first = repo
            .list(&ItemFilter {
                page: Page::new(Some(0), Some(10)),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = repo
            .list(&ItemFilter {
                page: Page::new(Some(10), Some(10)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 5);
        assert!(first
            .iter()
            .all(|a| second.iter().all(|b| a.item_id != b.item_id)));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let bob = user(&db, "bob").await;
        let tools_id = tools(&db).await;
        let paint_id = db.categories().get_or_create("Paint").await.unwrap().category_id;

        let specs = [
            ("Claw Hammer", tools_id, alice.user_id),
            ("Sledgehammer", tools_id, bob.user_id),
            ("Red Paint", paint_id, alice.user_id),
        ];
        for (name, category_id, owner) in specs {
            let mut item = widget(owner, CategoryRef::Id(category_id));
            item.name = name.to_string();
            db.items().create(&item).await.unwrap();
        }

        let repo = db.items();
        let by_search = repo
            .list(&ItemFilter {
                search: Some("HAMMER".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_search.len(), 2);

        let by_category = repo
            .list(&ItemFilter {
                category_id: Some(paint_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].name, "Red Paint");

        let by_owner = repo
            .list(&ItemFilter {
                search: Some("hammer".to_string()),
                owner_id: Some(alice.user_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_owner.len(), 1);
        assert_eq!(by_owner[0].name, "Claw Hammer");
    }

    #[tokio::test]
    async fn test_delete_removes_links() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let mut item = widget(alice.user_id, CategoryRef::Id(tools(&db).await));
        item.supplier = Some("Acme".to_string());

        let repo = db.items();
        let created = repo.create(&item).await.unwrap();
        repo.add_supplier(created.item_id, "Globex").await.unwrap();
        assert_eq!(repo.links(created.item_id).await.unwrap().len(), 2);
        let names: Vec<String> = repo
            .suppliers_for(created.item_id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Acme", "Globex"]);

        let deleted = repo.delete(created.item_id).await.unwrap().unwrap();
        assert_eq!(deleted.item_id, created.item_id);
        assert!(repo.get(created.item_id).await.unwrap().is_none());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item_suppliers")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        // suppliers outlive the item
        assert_eq!(db.suppliers().list(Page::default(), None).await.unwrap().len(), 2);
        assert!(repo.delete(created.item_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_supplier_delete_removes_links() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let mut item = widget(alice.user_id, CategoryRef::Id(tools(&db).await));
        item.supplier = Some("Acme".to_string());
        let created = db.items().create(&item).await.unwrap();

        let acme = db.suppliers().get_by_name("Acme").await.unwrap().unwrap();
        db.suppliers().delete(acme.supplier_id).await.unwrap().unwrap();

        assert!(db.items().links(created.item_id).await.unwrap().is_empty());
        assert!(db.items().get(created.item_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_category_in_use_cannot_be_deleted() {
        let db = memory_db().await;
        let alice = user(&db, "alice").await;
        let category_id = tools(&db).await;
        db.items()
            .create(&widget(alice.user_id, CategoryRef::Id(category_id)))
            .await
            .unwrap();

        let err = db.categories().delete(category_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
