//! PostgreSQL implementation of BanRepository

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use guild_core::entities::Ban;
use guild_core::error::DomainError;
use guild_core::traits::{BanRepository, RepoResult};
use guild_core::value_objects::Snowflake;

use crate::models::BanModel;

use super::error::map_db_error;

/// PostgreSQL implementation of BanRepository
#[derive(Clone)]
pub struct PgBanRepository {
    pool: PgPool,
}

impl PgBanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BanRepository for PgBanRepository {
    #[instrument(skip(self))]
    async fn find(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Ban>> {
        let result = sqlx::query_as::<_, BanModel>(
            r"
            SELECT guild_id, user_id, moderator_id, reason, expires_at, created_at
            FROM bans
            WHERE guild_id = $1 AND user_id = $2
            ",
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Ban::from))
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Ban>> {
        let results = sqlx::query_as::<_, BanModel>(
            r"
            SELECT guild_id, user_id, moderator_id, reason, expires_at, created_at
            FROM bans
            WHERE guild_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(guild_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Ban::from).collect())
    }

    #[instrument(skip(self, ban), fields(guild_id = %ban.guild_id, user_id = %ban.user_id))]
    async fn save(&self, ban: &Ban) -> RepoResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;
        upsert_ban(&mut conn, ban).await
    }

    /// Takes the guild row exclusively, which waits out any in-flight
    /// `create_unless_banned` for the guild
    #[instrument(skip(self, ban), fields(guild_id = %ban.guild_id, user_id = %ban.user_id))]
    async fn ban_member(&self, ban: &Ban) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let guild = sqlx::query_scalar::<_, i64>("SELECT id FROM guilds WHERE id = $1 FOR UPDATE")
            .bind(ban.guild_id.into_inner())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if guild.is_none() {
            return Err(DomainError::GuildNotFound(ban.guild_id));
        }

        upsert_ban(&mut tx, ban).await?;

        let removed = sqlx::query("DELETE FROM guild_members WHERE guild_id = $1 AND user_id = $2")
            .bind(ban.guild_id.into_inner())
            .bind(ban.user_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(removed.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM bans WHERE guild_id = $1 AND user_id = $2")
            .bind(guild_id.into_inner())
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

async fn upsert_ban(conn: &mut PgConnection, ban: &Ban) -> RepoResult<()> {
    sqlx::query(
        r"
        INSERT INTO bans (guild_id, user_id, moderator_id, reason, expires_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (guild_id, user_id) DO UPDATE
        SET moderator_id = EXCLUDED.moderator_id,
            reason = EXCLUDED.reason,
            expires_at = EXCLUDED.expires_at,
            created_at = EXCLUDED.created_at
        ",
    )
    .bind(ban.guild_id.into_inner())
    .bind(ban.user_id.into_inner())
    .bind(ban.moderator_id.into_inner())
    .bind(&ban.reason)
    .bind(ban.expires_at)
    .bind(ban.created_at)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgBanRepository>();
    }
}
