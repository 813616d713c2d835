//! `/items`: inventory CRUD over the bearer-token API.
//!
//! Regular users see and change only the items they created. Admins see all
//! items.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stockroom_core::{
    Category, CategoryRef, InventoryItem, ItemFilter, ItemSupplier, ItemUpdate, Money, NewItem,
    Page, Supplier, User,
};
use stockroom_db::Database;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item).post(update_item).put(update_item).delete(delete_item),
        )
        .route("/items/{id}/suppliers", post(add_supplier))
}

/// An item with its category and linked suppliers.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub category: Option<Category>,
    pub suppliers: Vec<Supplier>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category_id: Option<i64>,
}

/// Create payload. Either `category_id` or a `category` name is required;
/// an unknown name creates the category.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Money,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSupplierRequest {
    pub name: String,
}

impl CreateItemRequest {
    fn into_new_item(self, created_by: i64) -> ApiResult<NewItem> {
        let category = match (self.category_id, self.category) {
            (Some(id), _) => CategoryRef::Id(id),
            (None, Some(name)) if !name.trim().is_empty() => CategoryRef::Name(name),
            _ => {
                return Err(ApiError::BadRequest(
                    "category_id or category is required".to_string(),
                ))
            }
        };
        Ok(NewItem {
            name: self.name,
            description: self.description,
            quantity: self.quantity,
            price: self.price,
            category,
            supplier: self.supplier,
            created_by,
        })
    }
}

/// Owner filter for `user`: `None` (everything) for admins.
pub(crate) fn owner_scope(user: &User) -> Option<i64> {
    if user.is_admin() {
        None
    } else {
        Some(user.user_id)
    }
}

/// Fetches an item the user may see, or `404`.
pub(crate) async fn visible_item(
    db: &Database,
    user: &User,
    item_id: i64,
) -> ApiResult<InventoryItem> {
    let item = match owner_scope(user) {
        Some(owner_id) => db.items().get_by_owner(item_id, owner_id).await?,
        None => db.items().get(item_id).await?,
    };
    item.ok_or_else(|| ApiError::not_found("Item"))
}

pub(crate) async fn item_response(db: &Database, item: InventoryItem) -> ApiResult<ItemResponse> {
    let category = db.categories().get(item.category_id).await?;
    let suppliers = db.items().suppliers_for(item.item_id).await?;
    Ok(ItemResponse {
        item,
        category,
        suppliers,
    })
}

async fn list_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ItemQuery>,
) -> ApiResult<Json<Vec<ItemResponse>>> {
    let filter = ItemFilter {
        page: Page::new(query.skip, query.limit),
        search: query.search,
        category_id: query.category_id,
        owner_id: owner_scope(&user),
    };
    let items = state.db.items().list(&filter).await?;

    let mut categories: HashMap<i64, Option<Category>> = HashMap::new();
    let mut responses = Vec::with_capacity(items.len());
    for item in items {
        let category = match categories.get(&item.category_id) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = state.db.categories().get(item.category_id).await?;
                categories.insert(item.category_id, fetched.clone());
                fetched
            }
        };
        let suppliers = state.db.items().suppliers_for(item.item_id).await?;
        responses.push(ItemResponse {
            item,
            category,
            suppliers,
        });
    }
    Ok(Json(responses))
}

async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<ItemResponse>)> {
    let new_item = request.into_new_item(user.user_id)?;
    let created = state.db.items().create(&new_item).await?;
    let response = item_response(&state.db, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<ItemResponse>> {
    let item = visible_item(&state.db, &user, item_id).await?;
    Ok(Json(item_response(&state.db, item).await?))
}

async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<i64>,
    Json(update): Json<ItemUpdate>,
) -> ApiResult<Json<ItemResponse>> {
    visible_item(&state.db, &user, item_id).await?;

    let updated = state
        .db
        .items()
        .update(item_id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Item"))?;
    Ok(Json(item_response(&state.db, updated).await?))
}

/// Answers with the item as it was before deletion.
async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<i64>,
) -> ApiResult<Json<ItemResponse>> {
    let item = visible_item(&state.db, &user, item_id).await?;
    let snapshot = item_response(&state.db, item).await?;

    state
        .db
        .items()
        .delete(item_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Unable to delete item".to_string()))?;

    info!(item_id, user_id = user.user_id, "Item deleted via API");
    Ok(Json(snapshot))
}

async fn add_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<i64>,
    Json(request): Json<AddSupplierRequest>,
) -> ApiResult<(StatusCode, Json<ItemSupplier>)> {
    visible_item(&state.db, &user, item_id).await?;
    let link = state.db.items().add_supplier(item_id, &request.name).await?;
    Ok((StatusCode::CREATED, Json(link)))
}
