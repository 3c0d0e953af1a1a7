//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::token::now_secs;
use crate::auth::{TokenCodec, TokenRejection, VerifiedToken};
use crate::config::{Config, SecurityConfig};
use crate::db::Store;
use crate::services::auth_service::{AuthError, AuthService, SessionToken, UserInfo};
use crate::services::validation;

pub struct SeaOrmAuthService {
    store: Store,
    codec: TokenCodec,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, codec: TokenCodec, security: SecurityConfig) -> Self {
        Self {
            store,
            codec,
            security,
        }
    }

    /// Builds the token codec from `auth.jwt_secret` / `auth.token_ttl`.
    pub fn from_config(store: Store, config: &Config) -> anyhow::Result<Self> {
        let codec = TokenCodec::new(config.auth.jwt_secret.as_bytes(), config.auth.token_ttl())?;
        Ok(Self::new(store, codec, config.security.clone()))
    }

    fn issue(&self, user_id: Uuid) -> Result<SessionToken, AuthError> {
        let issued = self.codec.issue(user_id)?;
        Ok(SessionToken {
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Cryptographic check first; the ledger is only consulted for tokens
    /// that would otherwise be accepted.
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let verified = self.codec.parse_and_verify(token).map_err(reject)?;

        if self.store.is_token_revoked(token, now_secs()).await? {
            return Err(reject(TokenRejection::Revoked));
        }

        Ok(verified)
    }
}

fn reject(reason: TokenRejection) -> AuthError {
    debug!(reason = reason.as_str(), "Rejected session token");
    metrics::counter!("auth_rejections_total", "reason" => reason.as_str()).increment(1);
    AuthError::Unauthenticated
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, AuthError> {
        let username = validation::validate_username(username).map_err(AuthError::Validation)?;
        let email = validation::normalize_email(email).map_err(AuthError::Validation)?;
        let password = validation::validate_password(password).map_err(AuthError::Validation)?;

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        // A concurrent registration can still win the race; the unique
        // index turns that into `None` here.
        let user = self
            .store
            .create_user(username, &email, password, &self.security)
            .await?
            .ok_or(AuthError::DuplicateEmail)?;

        info!(user_id = %user.id, "Registered new user");

        self.issue(user.id)
    }

    async fn login(&self, email: &str, password: &str) -> Result<SessionToken, AuthError> {
        let email = validation::normalize_email(email).map_err(AuthError::Validation)?;
        validation::validate_password(password).map_err(AuthError::Validation)?;

        let user = self
            .store
            .verify_user_credentials(&email, password, &self.security)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        info!(user_id = %user.id, "User logged in");

        self.issue(user.id)
    }

    async fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        self.verify_token(token).await.map(|v| v.subject)
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let verified = self.verify_token(token).await?;

        self.store
            .revoke_token(token, verified.subject, verified.expires_at)
            .await?;

        info!(user_id = %verified.subject, "User logged out, token revoked");
        Ok(())
    }

    async fn current_user(&self, user_id: Uuid) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        })
    }

    async fn purge_revoked(&self) -> Result<u64, AuthError> {
        let purged = self.store.purge_expired_tokens(now_secs()).await?;
        metrics::counter!("revoked_tokens_purged_total").increment(purged);
        Ok(purged)
    }
}
