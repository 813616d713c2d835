//! Error types for the HTTP layer.
//!
//! Every handler returns [`ApiResult`]. Failures render as
//! `{"detail": "<message>"}` with the matching status code.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stockroom_core::{CoreError, ValidationError};
use stockroom_db::DbError;
use tracing::{error, warn};

/// Message returned to callers whose credentials could not be used.
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// HTTP API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the role does not allow the operation.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// An outbound service (exchange rates, OAuth provider) failed.
    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn credentials() -> Self {
        ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
    }

    pub fn not_found(entity: &str) -> Self {
        ApiError::NotFound(format!("{entity} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                "Internal server error".to_string()
            }
            ApiError::Upstream(msg) => {
                warn!(error = %msg, "Upstream call failed");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "detail": detail }));
        match self {
            ApiError::Unauthorized(_) => {
                (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { entity, .. } => ApiError::not_found(&entity),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::BadRequest(error.to_string())
            }
            DbError::Invalid(invalid) => ApiError::BadRequest(invalid.to_string()),
            DbError::Domain(domain) => ApiError::BadRequest(domain.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::credentials().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("no".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Upstream("down".into()).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_db_errors_map_to_client_errors() {
        let err: ApiError = DbError::duplicate("username", "alice").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = DbError::not_found("Item", 7).into();
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Item not found"));

        let err: ApiError = DbError::ConnectionFailed("pool is closed".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::credentials().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn test_internal_detail_is_generic() {
        let response = ApiError::Internal("secret path /var/db".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
