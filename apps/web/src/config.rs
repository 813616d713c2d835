//! Web server configuration.
//!
//! Loaded with the `config` crate from an optional `stockroom.toml` in the
//! working directory, then from environment variables (environment wins).
//! Keys are case-insensitive, so `SECRET_KEY` in the environment and
//! `secret_key` in the file name the same setting.

use std::net::SocketAddr;
use std::str::FromStr;

use config::{Config, Environment, File};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use stockroom_core::validation::normalize_currency_code;
use stockroom_core::BASE_CURRENCY;

const CONFIG_FILE: &str = "stockroom";

const DEFAULT_ALGORITHM: &str = "HS256";
const DEFAULT_EXPIRE_MINUTES: i64 = 30;
const DEFAULT_DATABASE_PATH: &str = "./stockroom.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8500";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8500/auth/google/callback";
const DEFAULT_EXCHANGE_RATE_URL: &str = "https://api.frankfurter.app";

/// Raw key/value view, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    secret_key: Option<String>,
    algorithm: Option<String>,
    access_token_expire_minutes: Option<i64>,
    database_path: Option<String>,
    bind_addr: Option<String>,
    google_client_id: Option<String>,
    google_client_secret: Option<String>,
    oauth_redirect_uri: Option<String>,
    exchange_rate_url: Option<String>,
    base_currency: Option<String>,
}

/// Google OAuth client credentials. Present only when both id and secret
/// are configured.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// HMAC secret for signing access tokens
    pub secret_key: String,

    /// JWT signing algorithm (HMAC family only)
    pub algorithm: Algorithm,

    /// Access token lifetime in minutes
    pub access_token_expire_minutes: i64,

    /// SQLite file, or `:memory:`
    pub database_path: String,

    pub bind_addr: SocketAddr,

    pub google: Option<GoogleOAuthConfig>,

    /// Base URL of the Frankfurter-compatible rate service
    pub exchange_rate_url: String,

    /// Currency prices are stored in
    pub base_currency: String,
}

impl WebConfig {
    /// Defaults for every optional key, with the given signing secret.
    pub fn new(secret_key: impl Into<String>) -> Self {
        WebConfig {
            secret_key: secret_key.into(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: DEFAULT_EXPIRE_MINUTES,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8500)),
            google: None,
            exchange_rate_url: DEFAULT_EXCHANGE_RATE_URL.to_string(),
            base_currency: BASE_CURRENCY.to_string(),
        }
    }

    /// Load configuration from `stockroom.toml` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::default())
            .build()?;
        Self::from_settings(settings)
    }

    /// Validate an already-built [`Config`].
    pub fn from_settings(settings: Config) -> Result<Self, ConfigError> {
        let raw: RawConfig = settings.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let secret_key = raw
            .secret_key
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("SECRET_KEY".to_string()))?;

        let algorithm = parse_algorithm(raw.algorithm.as_deref().unwrap_or(DEFAULT_ALGORITHM))?;

        let access_token_expire_minutes =
            raw.access_token_expire_minutes.unwrap_or(DEFAULT_EXPIRE_MINUTES);
        if access_token_expire_minutes <= 0 {
            return Err(ConfigError::InvalidValue("ACCESS_TOKEN_EXPIRE_MINUTES".to_string()));
        }

        let bind_addr = raw
            .bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string()))?;

        let base_currency =
            normalize_currency_code(raw.base_currency.as_deref().unwrap_or(BASE_CURRENCY))
                .map_err(|_| ConfigError::InvalidValue("BASE_CURRENCY".to_string()))?;

        let google = match (non_blank(raw.google_client_id), non_blank(raw.google_client_secret)) {
            (Some(client_id), Some(client_secret)) => Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                redirect_uri: non_blank(raw.oauth_redirect_uri)
                    .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingRequired("GOOGLE_CLIENT_SECRET".to_string()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingRequired("GOOGLE_CLIENT_ID".to_string()))
            }
        };

        Ok(WebConfig {
            secret_key,
            algorithm,
            access_token_expire_minutes,
            database_path: non_blank(raw.database_path)
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            bind_addr,
            google,
            exchange_rate_url: non_blank(raw.exchange_rate_url)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_URL.to_string()),
            base_currency,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Only the HMAC algorithms can sign with a shared secret.
fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(name.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::InvalidValue("ALGORITHM".to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Config {
        let mut builder = Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        builder.build().unwrap()
    }

    /// Loads `pairs` on top of a valid secret key.
    fn with_secret(pairs: &[(&str, &str)]) -> Result<WebConfig, ConfigError> {
        let mut all = vec![("secret_key", "k")];
        all.extend_from_slice(pairs);
        WebConfig::from_settings(settings(&all))
    }

    #[test]
    fn test_defaults_apply() {
        let config = WebConfig::from_settings(settings(&[("secret_key", "s3cret")])).unwrap();

        assert_eq!(config.algorithm, Algorithm::HS256);
        assert_eq!(config.access_token_expire_minutes, 30);
        assert_eq!(config.database_path, "./stockroom.db");
        assert_eq!(config.bind_addr.port(), 8500);
        assert_eq!(config.base_currency, "CAD");
        assert!(config.google.is_none());
    }

    #[test]
    fn test_secret_key_is_required() {
        let err = WebConfig::from_settings(settings(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref key) if key == "SECRET_KEY"));

        let err = WebConfig::from_settings(settings(&[("secret_key", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_algorithm_restricted_to_hmac() {
        let config = with_secret(&[("algorithm", "HS512")]).unwrap();
        assert_eq!(config.algorithm, Algorithm::HS512);

        for bad in ["RS256", "none", "hs256x"] {
            let err = with_secret(&[("algorithm", bad)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue(ref key) if key == "ALGORITHM"),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_google_needs_both_credentials() {
        let config = WebConfig::from_settings(settings(&[
            ("secret_key", "k"),
            ("google_client_id", "id"),
            ("google_client_secret", "secret"),
        ]))
        .unwrap();
        let google = config.google.unwrap();
        assert_eq!(google.redirect_uri, "http://localhost:8500/auth/google/callback");

        let err = with_secret(&[("google_client_id", "id")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingRequired(ref key) if key == "GOOGLE_CLIENT_SECRET")
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = with_secret(&[("bind_addr", "nowhere")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "BIND_ADDR"));

        let err = with_secret(&[("access_token_expire_minutes", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let config = with_secret(&[("base_currency", "usd")]).unwrap();
        assert_eq!(config.base_currency, "USD");
    }
}
