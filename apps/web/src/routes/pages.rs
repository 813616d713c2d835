//! Cookie-session pages.
//!
//! Each page answers with its view model as JSON (`"view"` names the page);
//! rendering is left to the client. Form posts answer with `302` redirects.
//! Requests without a valid session cookie are redirected to `/login`.
//!
//! ```text
//! POST /login ──ok──► Set-Cookie: access_token ──302──► /profile
//!      │
//!      └─fail─► {"view": "login", "error": "Invalid Credentials"}
//! ```

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stockroom_core::dashboard::Dashboard;
use stockroom_core::validation::normalize_currency_code;
use stockroom_core::{
    CategoryRef, InventoryItem, ItemFilter, ItemUpdate, Money, NewItem, Page, Role, User,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::extract::{found, PageUser, SESSION_COOKIE};
use crate::services::identity::USERNAME_TAKEN;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login_submit))
        .route("/register", get(register_page).post(register_submit))
        .route("/logout", get(logout))
        .route("/profile", get(profile))
        .route("/dashboard", get(dashboard))
        .route("/inventory/manage", get(manage_inventory))
        .route("/inventory/view", get(view_inventory))
        .route("/inventory/add", post(add_item))
        .route("/inventory/edit/{id}", post(edit_item))
        .route("/inventory/delete/{id}", get(delete_item))
}

/// The `access_token` session cookie, HTTP-only.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// =============================================================================
// Forms & Queries
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    pub search: Option<String>,
    /// Kept as text: the filter form submits an empty value for "all".
    pub category_id: Option<String>,
    pub page: Option<i64>,
    pub currency: Option<String>,
}

/// Add/edit form. Blank `category` means "use `category_id`".
#[derive(Debug, Deserialize)]
pub struct ItemForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i64,
    pub price: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub supplier: String,
}

// =============================================================================
// View Models
// =============================================================================

#[derive(Debug, Serialize)]
pub struct CategoryOption {
    pub category_id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct InventoryView {
    pub view: &'static str,
    pub current_user: User,
    pub items: Vec<InventoryItem>,
    pub categories: Vec<CategoryOption>,
    pub search: Option<String>,
    pub selected_category: Option<i64>,
    pub page: i64,
    pub limit: i64,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
    pub currency: String,
    pub exchange_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub view: &'static str,
    pub current_user: User,
    #[serde(flatten)]
    pub dashboard: Dashboard,
}

// =============================================================================
// Session
// =============================================================================

async fn index() -> Json<Value> {
    Json(json!({ "view": "index" }))
}

async fn login_page() -> Json<Value> {
    Json(json!({ "view": "login" }))
}

async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> ApiResult<Response> {
    let user = match state.identity.authenticate(&form.username, &form.password).await {
        Ok(user) => user,
        Err(ApiError::BadRequest(_)) => {
            let view = json!({ "view": "login", "error": "Invalid Credentials" });
            return Ok(Json(view).into_response());
        }
        Err(other) => return Err(other),
    };

    let token = state.identity.session_token(&user)?;
    info!(user_id = user.user_id, "Session started");
    Ok((jar.add(session_cookie(token)), found("/profile")).into_response())
}

async fn register_page() -> Json<Value> {
    let roles: Vec<&str> = Role::all().iter().map(Role::as_str).collect();
    Json(json!({ "view": "register", "roles": roles }))
}

async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> ApiResult<Response> {
    let role = if form.role.trim().is_empty() {
        Ok(Role::default())
    } else {
        form.role.parse::<Role>().map_err(ApiError::from)
    };

    let registered = match role {
        Ok(role) => state.identity.register(&form.username, &form.password, role).await,
        Err(e) => Err(e),
    };

    match registered {
        Ok(_) => Ok(found("/login")),
        Err(ApiError::BadRequest(msg)) => {
            let error = if msg == USERNAME_TAKEN {
                "User already registered".to_string()
            } else {
                format!("Registration failed: {msg}")
            };
            Ok(Json(json!({ "view": "register", "error": error })).into_response())
        }
        Err(other) => Err(other),
    }
}

async fn logout(jar: CookieJar) -> (CookieJar, Response) {
    (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), found("/login"))
}

async fn profile(PageUser(user): PageUser) -> Json<Value> {
    Json(json!({ "view": "profile", "current_user": user }))
}

async fn dashboard(
    State(state): State<AppState>,
    PageUser(user): PageUser,
) -> ApiResult<Json<DashboardView>> {
    let dashboard = state.db.dashboard().dashboard(user.user_id).await?;
    Ok(Json(DashboardView {
        view: "dashboard",
        current_user: user,
        dashboard,
    }))
}

// =============================================================================
// Inventory
// =============================================================================

fn parse_category_id(raw: Option<&str>) -> ApiResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid category id: {value}"))),
    }
}

/// One page of the user's own items plus the category dropdown.
async fn inventory_view(
    state: &AppState,
    user: User,
    query: InventoryQuery,
    view: &'static str,
) -> ApiResult<InventoryView> {
    let page = query.page.unwrap_or(1).max(1);
    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let selected_category = parse_category_id(query.category_id.as_deref())?;

    let items = state
        .db
        .items()
        .list(&ItemFilter {
            page: Page::numbered(page),
            search: search.clone(),
            category_id: selected_category,
            owner_id: Some(user.user_id),
        })
        .await?;

    let categories = state
        .db
        .categories()
        .list(Page::new(None, Some(MAX_PAGE_SIZE)), None)
        .await?
        .into_iter()
        .map(|c| CategoryOption {
            category_id: c.category_id,
            name: c.name,
        })
        .collect();

    let next_page = (items.len() as i64 == DEFAULT_PAGE_SIZE)
        .then(|| page.checked_add(1))
        .flatten();
    Ok(InventoryView {
        view,
        current_user: user,
        items,
        categories,
        search,
        selected_category,
        page,
        limit: DEFAULT_PAGE_SIZE,
        prev_page: (page > 1).then_some(page - 1),
        next_page,
        currency: state.config.base_currency.clone(),
        exchange_rate: 1.0,
    })
}

async fn manage_inventory(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Query(query): Query<InventoryQuery>,
) -> ApiResult<Json<InventoryView>> {
    Ok(Json(inventory_view(&state, user, query, "manage_inventory").await?))
}

/// Read-only listing with prices converted to `currency`.
async fn view_inventory(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Query(mut query): Query<InventoryQuery>,
) -> ApiResult<Json<InventoryView>> {
    let base = state.config.base_currency.clone();
    let currency = match query.currency.take().filter(|c| !c.trim().is_empty()) {
        Some(code) => normalize_currency_code(&code)?,
        None => base.clone(),
    };

    let mut view = inventory_view(&state, user, query, "view_inventory").await?;
    if currency != base {
        let rate = state.rates.rate(&base, &currency).await?;
        for item in &mut view.items {
            item.price = item.price.convert(rate)?;
        }
        debug!(%currency, rate, "Converted inventory prices");
        view.exchange_rate = rate;
    }
    view.currency = currency;
    Ok(Json(view))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn add_item(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Form(form): Form<ItemForm>,
) -> ApiResult<Response> {
    let category = match parse_category_id(Some(&form.category_id))? {
        Some(id) => CategoryRef::Id(id),
        None => CategoryRef::Name(
            non_blank(form.category)
                .ok_or_else(|| ApiError::BadRequest("Category is required".to_string()))?,
        ),
    };

    let item = state
        .db
        .items()
        .create(&NewItem {
            name: form.name,
            description: non_blank(form.description),
            quantity: form.quantity,
            price: Money::parse(&form.price)?,
            category,
            supplier: non_blank(form.supplier),
            created_by: user.user_id,
        })
        .await?;

    info!(item_id = item.item_id, user_id = user.user_id, "Item added from form");
    Ok(found("/inventory/manage"))
}

async fn edit_item(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(item_id): Path<i64>,
    Form(form): Form<ItemForm>,
) -> ApiResult<Response> {
    let items = state.db.items();
    items
        .get_by_owner(item_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item"))?;

    let category_id = match non_blank(form.category) {
        Some(name) => state.db.categories().get_or_create(&name).await?.category_id,
        None => parse_category_id(Some(&form.category_id))?
            .ok_or_else(|| ApiError::BadRequest("Category is required".to_string()))?,
    };

    let update = ItemUpdate {
        name: Some(form.name),
        description: Some(non_blank(form.description)),
        quantity: Some(form.quantity),
        price: Some(Money::parse(&form.price)?),
        category_id: Some(category_id),
    };
    items
        .update(item_id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Item"))?;

    Ok(found("/inventory/manage"))
}

async fn delete_item(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(item_id): Path<i64>,
) -> ApiResult<Response> {
    let items = state.db.items();
    items
        .get_by_owner(item_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item"))?;
    items.delete(item_id).await?;

    info!(item_id, user_id = user.user_id, "Item deleted from page");
    Ok(found("/inventory/manage"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_id() {
        assert_eq!(parse_category_id(None).unwrap(), None);
        assert_eq!(parse_category_id(Some("  ")).unwrap(), None);
        assert_eq!(parse_category_id(Some(" 7 ")).unwrap(), Some(7));
        assert!(parse_category_id(Some("tools")).is_err());
    }

    #[test]
    fn test_session_cookie_is_http_only() {
        let cookie = session_cookie("abc".to_string());
        assert_eq!(cookie.name(), "access_token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
