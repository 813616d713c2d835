//! `/api/dashboard/*`: owner-scoped aggregates for the dashboard page's
//! scripts. Authenticated with the session cookie.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use stockroom_core::dashboard::{InventorySummary, LowStockEntry};

use crate::error::ApiResult;
use crate::extract::SessionUser;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/summary", get(summary))
        .route("/api/dashboard/low-stock", get(low_stock))
}

async fn summary(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> ApiResult<Json<InventorySummary>> {
    Ok(Json(state.db.dashboard().summary(user.user_id).await?))
}

async fn low_stock(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> ApiResult<Json<Vec<LowStockEntry>>> {
    Ok(Json(state.db.dashboard().low_stock(user.user_id).await?))
}
