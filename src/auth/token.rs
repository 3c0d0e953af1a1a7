//! Session token issuance and validation.

use std::time::Duration;

use anyhow::Result;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use super::claims::Claims;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Why a token was refused. Only ever logged; callers outside the auth
/// service see a single "unauthenticated" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("malformed token")]
    Malformed,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("unexpected signing algorithm")]
    UnexpectedAlgorithm,

    #[error("token expired")]
    Expired,

    #[error("token revoked")]
    Revoked,
}

impl TokenRejection {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::InvalidSignature => "invalid_signature",
            Self::UnexpectedAlgorithm => "unexpected_algorithm",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

/// The parts of a token the rest of the system cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: Uuid,
    /// Unix seconds.
    pub expires_at: i64,
}

/// Signs and verifies HS256 session tokens with a secret fixed at construction.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenCodec {
    /// Create a codec for `secret`. Tokens live for `ttl`, rounded down to
    /// whole seconds with a floor of one second.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("Token signing secret must not be empty");
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.algorithms = vec![ALGORITHM];
        validation.leeway = 0;
        // Expiry is checked against our own clock in `parse_and_verify_at`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1),
        })
    }

    #[must_use]
    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `subject` valid from now for the configured ttl.
    pub fn issue(&self, subject: Uuid) -> Result<IssuedToken> {
        self.issue_at(subject, now_secs())
    }

    pub fn issue_at(&self, subject: Uuid, now: i64) -> Result<IssuedToken> {
        let expires_at = now.saturating_add(self.ttl_secs);

        let claims = Claims {
            jti: Uuid::new_v4().to_string(),
            sub: subject.to_string(),
            iat: now,
            exp: expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {e}"))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature, algorithm and expiry, returning the subject.
    pub fn parse_and_verify(&self, token: &str) -> Result<VerifiedToken, TokenRejection> {
        self.parse_and_verify_at(token, now_secs())
    }

    pub fn parse_and_verify_at(
        &self,
        token: &str,
        now: i64,
    ) -> Result<VerifiedToken, TokenRejection> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(e.kind()))?;
        let claims = data.claims;

        if claims.exp <= now {
            return Err(TokenRejection::Expired);
        }

        let subject = Uuid::parse_str(&claims.sub).map_err(|_| TokenRejection::Malformed)?;

        Ok(VerifiedToken {
            subject,
            expires_at: claims.exp,
        })
    }
}

fn classify(kind: &ErrorKind) -> TokenRejection {
    match kind {
        ErrorKind::InvalidSignature => TokenRejection::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenRejection::Expired,
        ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm => TokenRejection::UnexpectedAlgorithm,
        _ => TokenRejection::Malformed,
    }
}

/// Current wall-clock time as unix seconds.
#[must_use]
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
