//! Google sign-in. Both routes answer `404` when OAuth is not configured.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::found;
use crate::routes::pages::session_cookie;
use crate::services::OAuthProvider;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

fn provider(state: &AppState) -> ApiResult<Arc<dyn OAuthProvider>> {
    state
        .oauth
        .clone()
        .ok_or_else(|| ApiError::NotFound("Google sign-in is not configured".to_string()))
}

async fn google_login(State(state): State<AppState>) -> ApiResult<Response> {
    let url = provider(&state)?.authorize_url()?;
    Ok(found(&url))
}

async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> ApiResult<(CookieJar, Response)> {
    let oauth = provider(&state)?;
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let email = oauth.verified_email(&code).await?;
    let user = state.identity.provision_external_user(&email).await?;
    let token = state.identity.session_token(&user)?;

    info!(user_id = user.user_id, "Signed in with Google");
    Ok((jar.add(session_cookie(token)), found("/profile")))
}
