//! PostgreSQL implementation of RoleRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use guild_core::entities::Role;
use guild_core::error::DomainError;
use guild_core::traits::{RepoResult, RoleRepository};
use guild_core::value_objects::Snowflake;

use crate::models::RoleModel;

use super::error::{count_to_u32, map_db_error};

const ROLE_COLUMNS: &str = "id, guild_id, name, color, hoist, position, permissions, mentionable, \
                            is_default, created_at, updated_at";

/// PostgreSQL implementation of RoleRepository
#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Role>> {
        let result = sqlx::query_as::<_, RoleModel>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Role::from))
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Role>> {
        let results = sqlx::query_as::<_, RoleModel>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE guild_id = $1 ORDER BY position, id"
        ))
        .bind(guild_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Role::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_default(&self, guild_id: Snowflake) -> RepoResult<Option<Role>> {
        let result = sqlx::query_as::<_, RoleModel>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE guild_id = $1 AND is_default"
        ))
        .bind(guild_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Role::from))
    }

    #[instrument(skip(self))]
    async fn count_by_guild(&self, guild_id: Snowflake) -> RepoResult<u32> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE guild_id = $1")
            .bind(guild_id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count_to_u32(count))
    }

    #[instrument(skip(self, role), fields(role_id = %role.id, guild_id = %role.guild_id))]
    async fn create(&self, role: &Role) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO roles (id, guild_id, name, color, hoist, position, permissions,
                               mentionable, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(role.id.into_inner())
        .bind(role.guild_id.into_inner())
        .bind(&role.name)
        .bind(role.color)
        .bind(role.hoist)
        .bind(role.position)
        .bind(role.permissions.to_i64())
        .bind(role.mentionable)
        .bind(role.is_default)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, role), fields(role_id = %role.id))]
    async fn update(&self, role: &Role) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE roles
            SET name = $2, color = $3, hoist = $4, position = $5, permissions = $6,
                mentionable = $7, updated_at = $8
            WHERE id = $1
            ",
        )
        .bind(role.id.into_inner())
        .bind(&role.name)
        .bind(role.color)
        .bind(role.hoist)
        .bind(role.position)
        .bind(role.permissions.to_i64())
        .bind(role.mentionable)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::RoleNotFound(role.id));
        }

        Ok(())
    }

    /// `member_roles` rows referencing the role are removed by `ON DELETE CASCADE`
    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let is_default =
            sqlx::query_scalar::<_, bool>("SELECT is_default FROM roles WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        match is_default {
            None => return Err(DomainError::RoleNotFound(id)),
            Some(true) => return Err(DomainError::CannotDeleteDefaultRole),
            Some(false) => {}
        }

        sqlx::query("DELETE FROM roles WHERE id = $1 AND NOT is_default")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, positions), fields(count = positions.len()))]
    async fn update_positions(
        &self,
        guild_id: Snowflake,
        positions: &[(Snowflake, i32)],
    ) -> RepoResult<()> {
        // Dropping the transaction without commit rolls every update back
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for (role_id, position) in positions {
            let result = sqlx::query(
                r"
                UPDATE roles
                SET position = $3, updated_at = NOW()
                WHERE id = $1 AND guild_id = $2
                ",
            )
            .bind(role_id.into_inner())
            .bind(guild_id.into_inner())
            .bind(position)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

            if result.rows_affected() == 0 {
                return Err(DomainError::RoleNotFound(*role_id));
            }
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }
}
