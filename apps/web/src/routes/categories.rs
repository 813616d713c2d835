//! `/categories`: shared category CRUD. Deleting requires the admin role.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use stockroom_core::{Category, CategoryUpdate, NewCategory};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AdminUser, CurrentUser};
use crate::routes::ListParams;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category)
                .post(update_category)
                .put(update_category)
                .delete(delete_category),
        )
}

async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Category>>> {
    let categories = state
        .db
        .categories()
        .list(params.page(), params.search.as_deref())
        .await?;
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.db.categories().create(&request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(category_id): Path<i64>,
) -> ApiResult<Json<Category>> {
    state
        .db
        .categories()
        .get(category_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

async fn update_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(category_id): Path<i64>,
    Json(update): Json<CategoryUpdate>,
) -> ApiResult<Json<Category>> {
    state
        .db
        .categories()
        .update(category_id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

/// Fails with `400` while items still reference the category.
async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(category_id): Path<i64>,
) -> ApiResult<Json<Category>> {
    state
        .db
        .categories()
        .delete(category_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}
