//! PostgreSQL implementation of GuildRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use guild_core::entities::Guild;
use guild_core::error::DomainError;
use guild_core::traits::{GuildRepository, RepoResult};
use guild_core::value_objects::Snowflake;

use crate::models::GuildModel;

use super::error::{count_to_u32, map_db_error};

/// PostgreSQL implementation of GuildRepository
#[derive(Clone)]
pub struct PgGuildRepository {
    pool: PgPool,
}

impl PgGuildRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildRepository for PgGuildRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Guild>> {
        let result = sqlx::query_as::<_, GuildModel>(
            r"
            SELECT id, name, owner_id, icon, banner, description, created_at, updated_at
            FROM guilds
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Guild::from))
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<Guild>> {
        let results = sqlx::query_as::<_, GuildModel>(
            r"
            SELECT g.id, g.name, g.owner_id, g.icon, g.banner, g.description, g.created_at, g.updated_at
            FROM guilds g
            JOIN guild_members gm ON gm.guild_id = g.id
            WHERE gm.user_id = $1
            ORDER BY gm.joined_at DESC
            ",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Guild::from).collect())
    }

    #[instrument(skip(self, guild), fields(guild_id = %guild.id))]
    async fn create(&self, guild: &Guild) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO guilds (id, name, owner_id, icon, banner, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(guild.id.into_inner())
        .bind(&guild.name)
        .bind(guild.owner_id.into_inner())
        .bind(&guild.icon)
        .bind(&guild.banner)
        .bind(&guild.description)
        .bind(guild.created_at)
        .bind(guild.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, guild), fields(guild_id = %guild.id))]
    async fn update(&self, guild: &Guild) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE guilds
            SET name = $2, owner_id = $3, icon = $4, banner = $5, description = $6, updated_at = $7
            WHERE id = $1
            ",
        )
        .bind(guild.id.into_inner())
        .bind(&guild.name)
        .bind(guild.owner_id.into_inner())
        .bind(&guild.icon)
        .bind(&guild.banner)
        .bind(&guild.description)
        .bind(guild.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::GuildNotFound(guild.id));
        }

        Ok(())
    }

    /// Hard delete; roles, members, bans and invites go with it through `ON DELETE CASCADE`
    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM guilds WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::GuildNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_owned_by(&self, owner_id: Snowflake) -> RepoResult<u32> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM guilds WHERE owner_id = $1")
            .bind(owner_id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count_to_u32(count))
    }
}
