//! PostgreSQL implementation of MemberRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use guild_core::entities::GuildMember;
use guild_core::error::DomainError;
use guild_core::traits::{MemberRepository, RepoResult};
use guild_core::value_objects::Snowflake;

use crate::mappers::member_with_roles;
use crate::models::GuildMemberModel;

use super::error::{count_to_u32, map_db_error, map_unique_violation};

/// Upper bound for a single page of members
const MAX_PAGE_SIZE: u32 = 1000;

/// PostgreSQL implementation of MemberRepository
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Role ids of a member in assignment order
    async fn load_role_ids(&self, guild_id: i64, user_id: i64) -> RepoResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            r"
            SELECT role_id FROM member_roles
            WHERE guild_id = $1 AND user_id = $2
            ORDER BY seq
            ",
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn with_roles(&self, models: Vec<GuildMemberModel>) -> RepoResult<Vec<GuildMember>> {
        let mut members = Vec::with_capacity(models.len());
        for model in models {
            let role_ids = self.load_role_ids(model.guild_id, model.user_id).await?;
            members.push(member_with_roles(model, role_ids));
        }
        Ok(members)
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<GuildMember>> {
        let result = sqlx::query_as::<_, GuildMemberModel>(
            r"
            SELECT guild_id, user_id, nickname, temporary, joined_at, updated_at
            FROM guild_members
            WHERE guild_id = $1 AND user_id = $2
            ",
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        match result {
            Some(model) => {
                let role_ids = self.load_role_ids(model.guild_id, model.user_id).await?;
                Ok(Some(member_with_roles(model, role_ids)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_guild(
        &self,
        guild_id: Snowflake,
        limit: u32,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<GuildMember>> {
        let limit = i64::from(limit.clamp(1, MAX_PAGE_SIZE));

        let models = sqlx::query_as::<_, GuildMemberModel>(
            r"
            SELECT guild_id, user_id, nickname, temporary, joined_at, updated_at
            FROM guild_members
            WHERE guild_id = $1 AND user_id > $2
            ORDER BY user_id
            LIMIT $3
            ",
        )
        .bind(guild_id.into_inner())
        .bind(after.map_or(i64::MIN, Snowflake::into_inner))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        self.with_roles(models).await
    }

    #[instrument(skip(self))]
    async fn is_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM guild_members WHERE guild_id = $1 AND user_id = $2)",
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn count_by_user(&self, user_id: Snowflake) -> RepoResult<u32> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM guild_members WHERE user_id = $1")
                .bind(user_id.into_inner())
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(count_to_u32(count))
    }

    /// Member row and its role rows are written in one transaction
    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    async fn create(&self, member: &GuildMember) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            INSERT INTO guild_members (guild_id, user_id, nickname, temporary, joined_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(member.guild_id.into_inner())
        .bind(member.user_id.into_inner())
        .bind(&member.nickname)
        .bind(member.temporary)
        .bind(member.joined_at)
        .bind(member.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::AlreadyMember))?;

        insert_role_rows(&mut tx, member).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    /// The guild row is share-locked first, so a concurrent
    /// [`BanRepository::ban_member`](guild_core::traits::BanRepository::ban_member)
    /// either commits before the ban check runs or waits for this insert
    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    async fn create_unless_banned(
        &self,
        member: &GuildMember,
        now: DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let guild = sqlx::query_scalar::<_, i64>("SELECT id FROM guilds WHERE id = $1 FOR SHARE")
            .bind(member.guild_id.into_inner())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;
        if guild.is_none() {
            return Err(DomainError::GuildNotFound(member.guild_id));
        }

        let result = sqlx::query(
            r"
            INSERT INTO guild_members (guild_id, user_id, nickname, temporary, joined_at, updated_at)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM bans
                WHERE guild_id = $1 AND user_id = $2
                  AND (expires_at IS NULL OR expires_at >= $7)
            )
            ",
        )
        .bind(member.guild_id.into_inner())
        .bind(member.user_id.into_inner())
        .bind(&member.nickname)
        .bind(member.temporary)
        .bind(member.joined_at)
        .bind(member.updated_at)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::AlreadyMember))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::Banned);
        }

        insert_role_rows(&mut tx, member).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    async fn update(&self, member: &GuildMember) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE guild_members
            SET nickname = $3, updated_at = $4
            WHERE guild_id = $1 AND user_id = $2
            ",
        )
        .bind(member.guild_id.into_inner())
        .bind(member.user_id.into_inner())
        .bind(&member.nickname)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MemberNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM guild_members WHERE guild_id = $1 AND user_id = $2")
            .bind(guild_id.into_inner())
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn add_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO member_roles (guild_id, user_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, user_id, role_id) DO NOTHING
            ",
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .bind(role_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_foreign_key_violation() => DomainError::MemberNotFound,
            _ => map_db_error(e),
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()> {
        sqlx::query("DELETE FROM member_roles WHERE guild_id = $1 AND user_id = $2 AND role_id = $3")
            .bind(guild_id.into_inner())
            .bind(user_id.into_inner())
            .bind(role_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }
}

async fn insert_role_rows(conn: &mut PgConnection, member: &GuildMember) -> RepoResult<()> {
    for role_id in &member.role_ids {
        sqlx::query(
            r"
            INSERT INTO member_roles (guild_id, user_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, user_id, role_id) DO NOTHING
            ",
        )
        .bind(member.guild_id.into_inner())
        .bind(member.user_id.into_inner())
        .bind(role_id.into_inner())
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;
    }
    Ok(())
}
