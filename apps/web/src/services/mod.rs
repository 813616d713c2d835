//! Application services shared by the HTTP handlers.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  IdentityService   passwords, tokens, users (SQLite via db)      │
//! │  RateProvider      base → target exchange rate (Frankfurter)     │
//! │  OAuthProvider     authorization code → verified email (Google)  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two outbound services sit behind traits so tests can swap in stubs.

pub mod currency;
pub mod identity;
pub mod oauth;

use std::time::Duration;

pub use currency::{FrankfurterClient, RateProvider};
pub use identity::IdentityService;
pub use oauth::{GoogleOAuth, OAuthProvider};

/// Timeout for every outbound HTTP call.
pub const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client used for exchange-rate and OAuth calls.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .user_agent(concat!("stockroom/", env!("CARGO_PKG_VERSION")))
        .build()
}
