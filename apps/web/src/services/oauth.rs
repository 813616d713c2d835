//! Google sign-in (authorization code flow).
//!
//! ```text
//! GET /auth/google/login ──302──► accounts.google.com (consent)
//!                                        │
//! GET /auth/google/callback?code= ◄──────┘
//!      │
//!      ├─► POST oauth2.googleapis.com/token       code → access token
//!      └─► GET  www.googleapis.com/oauth2/v1/userinfo   → email
//! ```

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GoogleOAuthConfig;
use crate::error::{ApiError, ApiResult};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";

/// External identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Consent page the browser is redirected to.
    fn authorize_url(&self) -> ApiResult<String>;

    /// Exchanges an authorization code for the account's verified email.
    async fn verified_email(&self, code: &str) -> ApiResult<String>;
}

pub struct GoogleOAuth {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    verified_email: Option<bool>,
}

impl GoogleOAuth {
    pub fn new(http: reqwest::Client, config: GoogleOAuthConfig) -> Self {
        GoogleOAuth { http, config }
    }

    async fn exchange_code(&self, code: &str) -> ApiResult<String> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Authorization code rejected");
            return Err(ApiError::BadRequest("Failed to exchange code for token".to_string()));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("unreadable token response: {e}")))?;
        Ok(tokens.access_token)
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn authorize_url(&self) -> ApiResult<String> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", "openid email profile"),
            ],
        )
        .map_err(|e| ApiError::Internal(format!("Invalid authorize URL: {e}")))?;
        Ok(url.into())
    }

    async fn verified_email(&self, code: &str) -> ApiResult<String> {
        let access_token = self.exchange_code(code).await?;

        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Userinfo request rejected");
            return Err(ApiError::BadRequest("Failed to retrieve user info".to_string()));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("unreadable userinfo response: {e}")))?;

        if info.verified_email == Some(false) {
            return Err(ApiError::BadRequest("Email address is not verified".to_string()));
        }
        let email = info
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Failed to retrieve user info".to_string()))?;

        debug!(email = %email, "Resolved external identity");
        Ok(email)
    }
}
