//! Domain service for authentication.
//!
//! Handles registration, login, session token verification and logout
//! (revocation). Every token failure collapses into
//! [`AuthError::Unauthenticated`]; the precise reason is only logged.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    DuplicateEmail,

    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token missing, malformed, badly signed, expired or revoked.
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// A session token handed to the client after register or login.
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and returns a session token for it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicateEmail`] if the email is taken.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, AuthError>;

    /// Checks credentials and returns a new session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on unknown email or wrong password.
    async fn login(&self, email: &str, password: &str) -> Result<SessionToken, AuthError>;

    /// Resolves a token to its user id: signature and expiry first, then the
    /// revocation ledger.
    async fn verify(&self, token: &str) -> Result<Uuid, AuthError>;

    /// Revokes a currently valid token.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Gets profile information for an authenticated user.
    async fn current_user(&self, user_id: Uuid) -> Result<UserInfo, AuthError>;

    /// Drops revocation entries whose tokens have expired anyway.
    async fn purge_revoked(&self) -> Result<u64, AuthError>;
}
