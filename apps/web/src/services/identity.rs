//! # Identity Service
//!
//! Password hashing, credential checks, token issue/verify and user lookup.
//! Built once at startup and shared through the application state.
//!
//! ## Request Pipeline
//! ```text
//! Authorization: Bearer <jwt>  ─┐
//!                                ├─► verify_token ─► resolve_user ─► User
//! Cookie: access_token=<jwt>   ─┘        │                │
//!                                  401 on bad token   401 if deleted
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Duration;
use stockroom_core::validation::{validate_password, validate_username};
use stockroom_core::{NewUser, Role, User, UNUSABLE_PASSWORD};
use stockroom_db::{Database, DbError};
use tokio::task;
use tracing::{debug, info, warn};

use crate::auth::JwtManager;
use crate::error::{ApiError, ApiResult};

pub const INCORRECT_LOGIN: &str = "Incorrect username or password";
pub const USERNAME_TAKEN: &str = "Username already registered.";
pub const INCORRECT_OLD_PASSWORD: &str = "Incorrect old password";
pub const ADMINS_ONLY: &str = "Operation not permitted. Admins only";

pub struct IdentityService {
    db: Database,
    jwt: JwtManager,
}

impl IdentityService {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        IdentityService { db, jwt }
    }

    // =========================================================================
    // Passwords
    // =========================================================================

    /// Hash a password with argon2id and a random salt, off the async runtime.
    pub async fn hash_password(&self, password: &str) -> ApiResult<String> {
        let password = password.to_string();

        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {e}")))?
    }

    /// `Ok(false)` on mismatch and for accounts without a usable password.
    pub async fn verify_password(&self, password: &str, hash: &str) -> ApiResult<bool> {
        if hash == UNUSABLE_PASSWORD {
            return Ok(false);
        }

        let password = password.to_string();
        let hash = hash.to_string();

        task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash).map_err(|e| {
                ApiError::Internal(format!("Stored password hash is malformed: {e}"))
            })?;

            match Argon2::default().verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(ApiError::Internal(format!("Password verification failed: {e}"))),
            }
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Verification task failed: {e}")))?
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// See [`JwtManager::issue_token`].
    pub fn issue_token(&self, subject: &str, ttl: Option<Duration>) -> ApiResult<String> {
        self.jwt.issue_token(subject, ttl)
    }

    /// Token for a login session, valid for the configured access lifetime.
    pub fn session_token(&self, user: &User) -> ApiResult<String> {
        self.jwt.issue_token(&user.username, Some(self.jwt.access_ttl()))
    }

    pub fn verify_token(&self, token: &str) -> ApiResult<String> {
        self.jwt.verify_token(token)
    }

    /// Looks up the user a token was issued to.
    pub async fn resolve_user(&self, subject: &str) -> ApiResult<User> {
        match self.db.users().get_by_username(subject).await? {
            Some(user) => Ok(user),
            None => {
                debug!(subject = %subject, "Token subject has no account");
                Err(ApiError::credentials())
            }
        }
    }

    /// `verify_token` followed by `resolve_user`.
    pub async fn user_from_token(&self, token: &str) -> ApiResult<User> {
        let subject = self.verify_token(token)?;
        self.resolve_user(&subject).await
    }

    /// Admins pass every role check; everyone else must hold `role` exactly.
    pub fn require_role(&self, user: User, role: Role) -> ApiResult<User> {
        if user.role == role || user.is_admin() {
            return Ok(user);
        }
        warn!(user = %user.username, required = %role, "Role check failed");
        Err(ApiError::Forbidden(ADMINS_ONLY.to_string()))
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Checks a username/password pair.
    pub async fn authenticate(&self, username: &str, password: &str) -> ApiResult<User> {
        let Some(user) = self.db.users().get_by_username(username.trim()).await? else {
            debug!(username = %username, "Login for unknown user");
            return Err(ApiError::BadRequest(INCORRECT_LOGIN.to_string()));
        };

        if !self.verify_password(password, &user.password).await? {
            debug!(username = %username, "Login with wrong password");
            return Err(ApiError::BadRequest(INCORRECT_LOGIN.to_string()));
        }

        Ok(user)
    }

    /// Creates an account.
    pub async fn register(&self, username: &str, password: &str, role: Role) -> ApiResult<User> {
        let username = username.trim();
        validate_username(username)?;
        validate_password(password)?;

        if self.db.users().get_by_username(username).await?.is_some() {
            return Err(ApiError::BadRequest(USERNAME_TAKEN.to_string()));
        }

        let password_hash = self.hash_password(password).await?;
        let user = self
            .db
            .users()
            .create(&NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => ApiError::BadRequest(USERNAME_TAKEN.to_string()),
                other => other.into(),
            })?;

        info!(
            user_id = user.user_id,
            username = %user.username,
            role = %user.role,
            "User registered"
        );
        Ok(user)
    }

    /// Replaces a password after checking the old one.
    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
    ) -> ApiResult<User> {
        if !self.verify_password(old_password, &user.password).await? {
            return Err(ApiError::BadRequest(INCORRECT_OLD_PASSWORD.to_string()));
        }
        validate_password(new_password)?;

        let hash = self.hash_password(new_password).await?;
        let updated = self.db.users().update_password(user.user_id, &hash).await?;

        info!(user_id = updated.user_id, "Password changed");
        Ok(updated)
    }

    /// Get-or-create a `regular` account for an externally verified email.
    ///
    /// New accounts get the unusable password, so they can only sign in
    /// through the provider.
    pub async fn provision_external_user(&self, email: &str) -> ApiResult<User> {
        let email = email.trim();
        validate_username(email)?;

        let users = self.db.users();
        if let Some(user) = users.get_by_username(email).await? {
            return Ok(user);
        }

        let created = users
            .create(&NewUser {
                username: email.to_string(),
                password_hash: UNUSABLE_PASSWORD.to_string(),
                role: Role::Regular,
            })
            .await;

        match created {
            Ok(user) => {
                info!(
                    user_id = user.user_id,
                    username = %user.username,
                    "External user provisioned"
                );
                Ok(user)
            }
            // Lost a race with a concurrent callback for the same email
            Err(DbError::UniqueViolation { .. }) => users
                .get_by_username(email)
                .await?
                .ok_or_else(|| ApiError::Internal(format!("User {email} vanished after conflict"))),
            Err(e) => Err(e.into()),
        }
    }
}
