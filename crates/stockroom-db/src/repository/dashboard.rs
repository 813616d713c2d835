//! # Dashboard Repository
//!
//! Loads one owner's stock rows and hands them to
//! [`stockroom_core::dashboard`] for aggregation.

use sqlx::SqlitePool;
use std::time::Instant;
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::dashboard::{self, Dashboard, InventorySummary, LowStockEntry};
use stockroom_core::StockRow;

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Every item created by `owner_id`, with category name and first supplier.
    pub async fn stock_rows(&self, owner_id: i64) -> DbResult<Vec<StockRow>> {
        let start = Instant::now();

        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT
                i.item_id,
                i.name,
                i.quantity,
                i.price_cents,
                c.name AS category_name,
                (
                    SELECT s.name
                    FROM item_suppliers l
                    INNER JOIN suppliers s ON s.supplier_id = l.supplier_id
                    WHERE l.item_id = i.item_id
                    ORDER BY l.id
                    LIMIT 1
                ) AS supplier_name,
                i.created_at
            FROM inventory_items i
            LEFT JOIN categories c ON c.category_id = i.category_id
            WHERE i.created_by = ?1
            ORDER BY i.item_id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            owner_id,
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dashboard rows"
        );
        Ok(rows)
    }

    pub async fn summary(&self, owner_id: i64) -> DbResult<InventorySummary> {
        Ok(dashboard::summarize(&self.stock_rows(owner_id).await?))
    }

    pub async fn low_stock(&self, owner_id: i64) -> DbResult<Vec<LowStockEntry>> {
        Ok(dashboard::low_stock(&self.stock_rows(owner_id).await?))
    }

    pub async fn dashboard(&self, owner_id: i64) -> DbResult<Dashboard> {
        Ok(Dashboard::build(&self.stock_rows(owner_id).await?))
    }
}
