//! PostgreSQL implementation of InviteRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use guild_core::entities::Invite;
use guild_core::error::DomainError;
use guild_core::traits::{InviteRepository, RepoResult};
use guild_core::value_objects::Snowflake;

use crate::models::InviteModel;

use super::error::{count_to_u32, map_db_error, map_unique_violation};

/// PostgreSQL implementation of InviteRepository
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, code: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM invites WHERE code = $1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    #[instrument(skip(self))]
    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Invite>> {
        let result = sqlx::query_as::<_, InviteModel>(
            r"
            SELECT code, guild_id, channel_id, inviter_id, uses, max_uses, temporary,
                   expires_at, created_at
            FROM invites
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Invite::from))
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Invite>> {
        let results = sqlx::query_as::<_, InviteModel>(
            r"
            SELECT code, guild_id, channel_id, inviter_id, uses, max_uses, temporary,
                   expires_at, created_at
            FROM invites
            WHERE guild_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(guild_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Invite::from).collect())
    }

    #[instrument(skip(self))]
    async fn count_by_guild(&self, guild_id: Snowflake) -> RepoResult<u32> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invites WHERE guild_id = $1")
            .bind(guild_id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count_to_u32(count))
    }

    #[instrument(skip(self, invite), fields(code = %invite.code, guild_id = %invite.guild_id))]
    async fn create(&self, invite: &Invite) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO invites (code, guild_id, channel_id, inviter_id, uses, max_uses,
                                 temporary, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&invite.code)
        .bind(invite.guild_id.into_inner())
        .bind(invite.channel_id.into_inner())
        .bind(invite.inviter_id.into_inner())
        .bind(i64::from(invite.uses))
        .bind(i64::from(invite.max_uses))
        .bind(invite.temporary)
        .bind(invite.expires_at)
        .bind(invite.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::InviteCodeExists))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn increment_uses(&self, code: &str) -> RepoResult<()> {
        let result = sqlx::query("UPDATE invites SET uses = uses + 1 WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::InviteNotFound(code.to_string()));
        }

        Ok(())
    }

    /// Single conditional UPDATE; the row lock serializes concurrent redemptions
    #[instrument(skip(self))]
    async fn increment_uses_bounded(&self, code: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE invites
            SET uses = uses + 1
            WHERE code = $1 AND (max_uses = 0 OR uses < max_uses)
            ",
        )
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if self.exists(code).await? {
            Ok(false)
        } else {
            Err(DomainError::InviteNotFound(code.to_string()))
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, code: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM invites WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result =
            sqlx::query("DELETE FROM invites WHERE expires_at IS NOT NULL AND expires_at < $1")
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
