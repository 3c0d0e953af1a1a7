//! Revocation ledger: tokens invalidated by logout before their natural expiry.

use crate::db::timestamp_now;
use crate::entities::{prelude::*, revoked_tokens};
use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

pub struct RevokedTokenRepository {
    conn: DatabaseConnection,
}

impl RevokedTokenRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Record `token` as revoked until `expires_at` (unix seconds).
    /// Revoking the same token again just adds another row.
    pub async fn revoke(&self, token: &str, user_id: Uuid, expires_at: i64) -> Result<()> {
        let active_model = revoked_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            token: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            created_at: Set(timestamp_now()),
        };

        RevokedTokens::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert revoked token")?;

        Ok(())
    }

    /// True iff an entry for exactly this token exists and has not expired.
    pub async fn is_revoked(&self, token: &str, now: i64) -> Result<bool> {
        let count = RevokedTokens::find()
            .filter(revoked_tokens::Column::Token.eq(token))
            .filter(revoked_tokens::Column::ExpiresAt.gt(now))
            .count(&self.conn)
            .await
            .context("Failed to query revoked tokens")?;

        Ok(count > 0)
    }

    /// Delete entries that expired at or before `now`.
    pub async fn purge_expired(&self, now: i64) -> Result<u64> {
        let result = RevokedTokens::delete_many()
            .filter(revoked_tokens::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to purge revoked tokens")?;

        Ok(result.rows_affected)
    }
}
