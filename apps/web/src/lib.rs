//! # Stockroom Web
//!
//! HTTP server for Stockroom: a bearer-token JSON API plus cookie-session
//! page routes that answer with view-model JSON.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Stockroom Web Server                           │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  JSON API      │  │  Pages         │  │  OAuth                     ││
//! │  │  (Bearer)      │  │  (Cookie)      │  │                            ││
//! │  │ • /auth/*      │  │ • /login       │  │ • /auth/google/login       ││
//! │  │ • /items       │  │ • /inventory/* │  │ • /auth/google/callback    ││
//! │  │ • /categories  │  │ • /dashboard   │  │                            ││
//! │  │ • /suppliers   │  │ • /api/dashb.. │  │                            ││
//! │  └───────┬────────┘  └───────┬────────┘  └─────────────┬──────────────┘│
//! │          └───────────────────┼─────────────────────────┘               │
//! │                              ▼                                          │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  AppState: Database · IdentityService · RateProvider · OAuth     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (or `stockroom.toml`):
//! - `SECRET_KEY` - Secret for JWT signing (required)
//! - `ALGORITHM` - HS256, HS384 or HS512 (default: HS256)
//! - `ACCESS_TOKEN_EXPIRE_MINUTES` - Access token lifetime (default: 30)
//! - `DATABASE_PATH` - SQLite file (default: ./stockroom.db)
//! - `BIND_ADDR` - Listen address (default: 0.0.0.0:8500)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - Enable Google sign-in
//! - `EXCHANGE_RATE_URL` - Frankfurter base URL
//! - `BASE_CURRENCY` - Currency prices are stored in (default: CAD)

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use chrono::Duration;
use stockroom_db::Database;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::WebConfig;
pub use error::{ApiError, ApiResult};

use crate::auth::JwtManager;
use crate::services::{FrankfurterClient, GoogleOAuth, IdentityService, OAuthProvider, RateProvider};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub identity: Arc<IdentityService>,
    pub rates: Arc<dyn RateProvider>,
    /// `None` when Google credentials are not configured.
    pub oauth: Option<Arc<dyn OAuthProvider>>,
    pub config: Arc<WebConfig>,
}

impl AppState {
    /// State with explicit outbound providers.
    pub fn new(
        db: Database,
        config: WebConfig,
        rates: Arc<dyn RateProvider>,
        oauth: Option<Arc<dyn OAuthProvider>>,
    ) -> Self {
        let jwt = JwtManager::new(
            &config.secret_key,
            config.algorithm,
            Duration::minutes(config.access_token_expire_minutes),
        );
        AppState {
            identity: Arc::new(IdentityService::new(db.clone(), jwt)),
            db,
            rates,
            oauth,
            config: Arc::new(config),
        }
    }

    /// State backed by the real Frankfurter and Google clients.
    pub fn from_config(db: Database, config: WebConfig) -> reqwest::Result<Self> {
        let http = services::http_client()?;
        let rates: Arc<dyn RateProvider> =
            Arc::new(FrankfurterClient::new(http.clone(), &config.exchange_rate_url));
        let oauth = config
            .google
            .clone()
            .map(|google| Arc::new(GoogleOAuth::new(http, google)) as Arc<dyn OAuthProvider>);
        Ok(Self::new(db, config, rates, oauth))
    }
}

/// Full application router with request tracing.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
