//! `/suppliers`: shared supplier CRUD. Deleting requires the admin role and
//! also removes the supplier's item links.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use stockroom_core::{NewSupplier, Supplier, SupplierUpdate};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::{AdminUser, CurrentUser};
use crate::routes::ListParams;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/{id}",
            get(get_supplier)
                .post(update_supplier)
                .put(update_supplier)
                .delete(delete_supplier),
        )
}

async fn list_suppliers(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Supplier>>> {
    let suppliers = state
        .db
        .suppliers()
        .list(params.page(), params.search.as_deref())
        .await?;
    Ok(Json(suppliers))
}

async fn create_supplier(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<NewSupplier>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let supplier = state.db.suppliers().create(&request).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn get_supplier(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(supplier_id): Path<i64>,
) -> ApiResult<Json<Supplier>> {
    state
        .db
        .suppliers()
        .get(supplier_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Supplier"))
}

async fn update_supplier(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(supplier_id): Path<i64>,
    Json(update): Json<SupplierUpdate>,
) -> ApiResult<Json<Supplier>> {
    state
        .db
        .suppliers()
        .update(supplier_id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Supplier"))
}

async fn delete_supplier(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(supplier_id): Path<i64>,
) -> ApiResult<Json<Supplier>> {
    let deleted = state
        .db
        .suppliers()
        .delete(supplier_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Supplier"))?;

    info!(supplier_id, by = %admin.username, "Supplier deleted via API");
    Ok(Json(deleted))
}
