//! Request extractors for the authenticated user.
//!
//! | Extractor     | Credential                      | Failure                 |
//! |---------------|---------------------------------|-------------------------|
//! | `CurrentUser` | `Authorization: Bearer <jwt>`   | 401 JSON                |
//! | `AdminUser`   | bearer, role `admin`            | 401 / 403 JSON          |
//! | `SessionUser` | `access_token` cookie           | 401 JSON                |
//! | `PageUser`    | `access_token` cookie           | 302 to `/login`         |

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::RequestPartsExt;
use axum_extra::extract::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use stockroom_core::{Role, User};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Cookie holding the session token on page routes.
pub const SESSION_COOKIE: &str = "access_token";

/// User authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Bearer-authenticated user holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

/// User authenticated with the session cookie; JSON errors.
#[derive(Debug, Clone)]
pub struct SessionUser(pub User);

/// User authenticated with the session cookie; redirects to the login page.
#[derive(Debug, Clone)]
pub struct PageUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                debug!("Missing or malformed authorization header");
                ApiError::Unauthorized("Not authenticated".to_string())
            })?;

        let user = state.identity.user_from_token(bearer.token()).await?;
        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let admin = state.identity.require_role(user, Role::Admin)?;
        Ok(AdminUser(admin))
    }
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        let user = state.identity.user_from_token(&token).await?;
        Ok(SessionUser(user))
    }
}

impl FromRequestParts<AppState> for PageUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match SessionUser::from_request_parts(parts, state).await {
            Ok(SessionUser(user)) => Ok(PageUser(user)),
            Err(ApiError::Unauthorized(_)) => Err(found("/login")),
            Err(other) => Err(other.into_response()),
        }
    }
}

/// `302 Found` redirect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
