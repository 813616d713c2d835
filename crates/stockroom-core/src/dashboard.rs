//! # Dashboard Aggregation
//!
//! Pure aggregation over a user's stock rows. stockroom-db loads the rows,
//! this module turns them into the numbers the dashboard shows.
//!
//! ```text
//! Vec<StockRow> ──► Dashboard::build ──► ┌ summary (value, count)
//!                                        ├ category_counts
//!                                        ├ price_buckets (5 fixed ranges)
//!                                        ├ low_stock (quantity < 10)
//!                                        ├ supplier_overview (top 5)
//!                                        └ recent_items (newest 5)
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::StockRow;
use crate::LOW_STOCK_THRESHOLD;

/// Label used for items whose category row could not be joined.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Price ranges in whole currency units, upper bounds inclusive.
pub const PRICE_BUCKETS: [(&str, Option<i64>); 5] = [
    ("0–50", Some(5_000)),
    ("51–100", Some(10_000)),
    ("101–200", Some(20_000)),
    ("201–500", Some(50_000)),
    ("500+", None),
];

const TOP_SUPPLIERS: usize = 5;
const RECENT_ITEMS: usize = 5;

// =============================================================================
// Output Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct InventorySummary {
    #[ts(as = "String")]
    pub total_inventory_value: Money,
    pub total_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct LowStockEntry {
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct SupplierOverview {
    pub unique_suppliers: usize,
    pub top_suppliers: Vec<LabelCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct RecentItem {
    pub item_id: i64,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub summary: InventorySummary,
    pub category_counts: Vec<LabelCount>,
    pub price_buckets: Vec<LabelCount>,
    pub low_stock: Vec<LowStockEntry>,
    pub supplier_overview: SupplierOverview,
    pub recent_items: Vec<RecentItem>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Total stock value (`Σ quantity × price`) and item count.
pub fn summarize(rows: &[StockRow]) -> InventorySummary {
    InventorySummary {
        total_inventory_value: rows
            .iter()
            .map(|r| r.price.multiply_quantity(r.quantity))
            .sum(),
        total_items: rows.len(),
    }
}

/// Items with quantity strictly below [`LOW_STOCK_THRESHOLD`], in input order.
pub fn low_stock(rows: &[StockRow]) -> Vec<LowStockEntry> {
    rows.iter()
        .filter(|r| r.quantity < LOW_STOCK_THRESHOLD)
        .map(|r| LowStockEntry {
            name: r.name.clone(),
            quantity: r.quantity,
        })
        .collect()
}

/// Item count per category, in order of first appearance.
pub fn category_counts(rows: &[StockRow]) -> Vec<LabelCount> {
    tally(
        rows.iter()
            .map(|r| r.category_name.as_deref().unwrap_or(UNCATEGORIZED)),
    )
}

/// Item count per fixed price range. Always five entries.
pub fn price_buckets(rows: &[StockRow]) -> Vec<LabelCount> {
    let mut counts = [0usize; PRICE_BUCKETS.len()];
    for row in rows {
        let cents = row.price.cents();
        let index = PRICE_BUCKETS
            .iter()
            .position(|(_, upper)| upper.map_or(true, |u| cents <= u))
            .unwrap_or(PRICE_BUCKETS.len() - 1);
        counts[index] += 1;
    }

    PRICE_BUCKETS
        .iter()
        .zip(counts)
        .map(|((label, _), count)| LabelCount {
            label: (*label).to_string(),
            count,
        })
        .collect()
}

/// Supplier coverage counted on each item's first supplier.
///
/// Ties in the top list keep first-appearance order.
pub fn supplier_overview(rows: &[StockRow]) -> SupplierOverview {
    let mut counts = tally(rows.iter().filter_map(|r| r.supplier_name.as_deref()));
    let unique_suppliers = counts.len();

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_SUPPLIERS);

    SupplierOverview {
        unique_suppliers,
        top_suppliers: counts,
    }
}

/// The five most recently created items, newest first.
pub fn recent_items(rows: &[StockRow]) -> Vec<RecentItem> {
    let mut sorted: Vec<&StockRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
        .into_iter()
        .take(RECENT_ITEMS)
        .map(|r| RecentItem {
            item_id: r.item_id,
            name: r.name.clone(),
            created_at: r.created_at,
        })
        .collect()
}

impl Dashboard {
    pub fn build(rows: &[StockRow]) -> Self {
        Dashboard {
            summary: summarize(rows),
            category_counts: category_counts(rows),
            price_buckets: price_buckets(rows),
            low_stock: low_stock(rows),
            supplier_overview: supplier_overview(rows),
            recent_items: recent_items(rows),
        }
    }
}

fn tally<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|c| c.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(LabelCount {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    counts
}

// =============================================================================
// Unit Tests
// =============================================================================
