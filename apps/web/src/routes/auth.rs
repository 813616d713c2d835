//! `/auth/*`: registration, bearer login, profile and admin user management.

use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stockroom_core::{Role, User};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::{AdminUser, CurrentUser};
use crate::routes::ListParams;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
        .route("/auth/admin", get(admin))
        .route("/auth/password", put(change_password))
        .route("/auth/users", get(list_users))
        .route(
            "/auth/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Login credentials from either a form post or a JSON body.
pub struct Credentials(pub LoginRequest);

impl<S> FromRequest<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let credentials = if is_json {
            let Json(body) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            body
        } else {
            let Form(body) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            body
        };
        Ok(Credentials(credentials))
    }
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let role = match request.role.as_deref() {
        Some(role) if !role.trim().is_empty() => role.parse::<Role>()?,
        _ => Role::default(),
    };

    let user = state
        .identity
        .register(&request.username, &request.password, role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    Credentials(request): Credentials,
) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .identity
        .authenticate(&request.username, &request.password)
        .await?;
    let access_token = state.identity.session_token(&user)?;

    info!(user_id = user.user_id, "Issued bearer token");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn profile(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn admin(AdminUser(user): AdminUser) -> Json<Value> {
    Json(json!({ "message": format!("Welcome, admin {}", user.username) }))
}

async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<User>> {
    let updated = state
        .identity
        .change_password(&user, &request.old_password, &request.new_password)
        .await?;
    Ok(Json(updated))
}

async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.db.users().list(params.page()).await?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<User>> {
    state
        .db
        .users()
        .get(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

/// Changes another account's role.
async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    if admin.user_id == user_id {
        return Err(ApiError::BadRequest("Admins cannot change their own role".to_string()));
    }
    let role = request.role.parse::<Role>()?;

    let updated = state
        .db
        .users()
        .update_role(user_id, role)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    info!(user_id, role = %role, by = %admin.username, "User role changed");
    Ok(Json(updated))
}

/// Deletes an account. Accounts that still own items cannot be deleted.
async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<User>> {
    if admin.user_id == user_id {
        return Err(ApiError::BadRequest("Admins cannot delete their own account".to_string()));
    }

    let deleted = state
        .db
        .users()
        .delete(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    info!(user_id, by = %admin.username, "User deleted");
    Ok(Json(deleted))
}
