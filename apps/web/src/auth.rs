//! JWT access tokens.
//!
//! Tokens carry the username as `sub`. They are signed with the configured
//! HMAC secret and checked with zero clock leeway.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Lifetime used when the caller does not pass one.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, algorithm: Algorithm, access_ttl: Duration) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            access_ttl,
        }
    }

    /// Lifetime of tokens issued by the login routes.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Sign a token for `subject`, valid for `ttl` (15 minutes when `None`).
    pub fn issue_token(&self, subject: &str, ttl: Option<Duration>) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + ttl.unwrap_or_else(|| Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES));

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {e}")))
    }

    /// Validate a token and return its subject.
    pub fn verify_token(&self, token: &str) -> ApiResult<String> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data: TokenData<Claims> = decode(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "Token rejected");
            ApiError::credentials()
        })?;

        let subject = token_data.claims.sub;
        if subject.trim().is_empty() {
            return Err(ApiError::credentials());
        }
        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secret: &str) -> JwtManager {
        JwtManager::new(secret, Algorithm::HS256, Duration::minutes(30))
    }

    #[test]
    fn test_jwt_roundtrip() {
        let jwt = manager("test-secret");
        let token = jwt.issue_token("alice", None).unwrap();
        assert_eq!(jwt.verify_token(&token).unwrap(), "alice");
    }

    #[test]
    fn test_default_ttl_is_fifteen_minutes() {
        let jwt = manager("test-secret");
        let token = jwt.issue_token("alice", None).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let key = DecodingKey::from_secret(b"test-secret");
        let data = decode::<Claims>(&token, &key, &validation).unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 15 * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = manager("test-secret");
        let token = jwt.issue_token("alice", Some(Duration::seconds(-5))).unwrap();
        assert!(matches!(jwt.verify_token(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = manager("someone-else").issue_token("alice", None).unwrap();
        assert!(manager("test-secret").verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_algorithm_rejected() {
        let hs384 = JwtManager::new("test-secret", Algorithm::HS384, Duration::minutes(30));
        let token = hs384.issue_token("alice", None).unwrap();
        assert!(manager("test-secret").verify_token(&token).is_err());
    }

    #[test]
    fn test_blank_subject_rejected() {
        let jwt = manager("test-secret");
        let token = jwt.issue_token("  ", None).unwrap();
        assert!(jwt.verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(manager("test-secret").verify_token("not.a.token").is_err());
    }
}
