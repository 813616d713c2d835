use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Liveness plus a `SELECT 1` against the database.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if database { "ok" } else { "degraded" },
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
