//! Role service
//!
//! Role creation, patching, deletion and reordering within a guild.

use guild_core::events::{GuildEvent, RoleEvent};
use guild_core::{DomainError, DomainEvent, GuildAction, QuotaLimits, Role, Snowflake};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{CreateRoleRequest, RoleResponse, UpdateRolePositionsRequest, UpdateRoleRequest};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::permission::PermissionService;

pub struct RoleService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoleService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a role at the end of the guild's role list
    #[instrument(skip(self, request))]
    pub async fn create_role(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        request: CreateRoleRequest,
    ) -> ServiceResult<RoleResponse> {
        request.validate()?;

        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::ManageRoles)
            .await?;

        let count = self.ctx.role_repo().count_by_guild(guild_id).await?;
        let limits = self.ctx.quota_limits(actor_id, Some(guild_id)).await?;
        if !QuotaLimits::allows(limits.max_roles_per_guild, count) {
            return Err(DomainError::QuotaExceeded(format!(
                "guild already has {count} roles (limit {})",
                limits.max_roles_per_guild
            ))
            .into());
        }

        let mut role = Role::new(
            self.ctx.generate_id(),
            guild_id,
            request.name,
            request.permissions.unwrap_or_default(),
        );
        role.set_color(request.color);
        role.set_hoist(request.hoist);
        role.set_mentionable(request.mentionable);
        role.set_position(i32::try_from(count).unwrap_or(i32::MAX));

        self.ctx.role_repo().create(&role).await?;

        info!(role_id = %role.id, guild_id = %guild_id, position = role.position, "Role created");

        self.ctx
            .publish(DomainEvent::RoleCreated(RoleEvent::new(guild_id, role.id)))
            .await;

        Ok(RoleResponse::from(&role))
    }

    #[instrument(skip(self))]
    pub async fn get_role(&self, role_id: Snowflake) -> ServiceResult<RoleResponse> {
        let role = self
            .ctx
            .role_repo()
            .find_by_id(role_id)
            .await?
            .ok_or(DomainError::RoleNotFound(role_id))?;

        Ok(RoleResponse::from(&role))
    }

    /// Roles of a guild in render order, visible to members only
    #[instrument(skip(self))]
    pub async fn list_roles(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<Vec<RoleResponse>> {
        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .require_member(&guild, actor_id)
            .await?;

        let roles = self.ctx.role_repo().find_by_guild(guild_id).await?;
        Ok(roles.into_iter().map(RoleResponse::from).collect())
    }

    /// Apply a partial update; an empty patch writes nothing
    #[instrument(skip(self, request))]
    pub async fn update_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateRoleRequest,
    ) -> ServiceResult<RoleResponse> {
        request.validate()?;

        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::ManageRoles)
            .await?;

        let mut role = self.role_in_guild(guild_id, role_id).await?;
        if request.is_empty() {
            return Ok(RoleResponse::from(&role));
        }

        if let Some(name) = request.name {
            role.set_name(name);
        }
        if let Some(color) = request.color {
            role.set_color(color);
        }
        if let Some(hoist) = request.hoist {
            role.set_hoist(hoist);
        }
        if let Some(permissions) = request.permissions {
            role.set_permissions(permissions);
        }
        if let Some(mentionable) = request.mentionable {
            role.set_mentionable(mentionable);
        }

        self.ctx.role_repo().update(&role).await?;

        info!(role_id = %role_id, "Role updated");

        self.ctx
            .publish(DomainEvent::RoleUpdated(RoleEvent::new(guild_id, role_id)))
            .await;

        Ok(RoleResponse::from(&role))
    }

    /// Delete a role; the repository strips it from every member
    #[instrument(skip(self))]
    pub async fn delete_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<()> {
        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::ManageRoles)
            .await?;

        let role = self.role_in_guild(guild_id, role_id).await?;
        if role.is_default {
            return Err(DomainError::CannotDeleteDefaultRole.into());
        }

        self.ctx.role_repo().delete(role_id).await?;

        info!(role_id = %role_id, guild_id = %guild_id, "Role deleted");

        self.ctx
            .publish(DomainEvent::RoleDeleted(RoleEvent::new(guild_id, role_id)))
            .await;

        Ok(())
    }

    /// Replace the positions of the listed roles in one repository call
    ///
    /// Ids outside the guild fail the whole request with `RoleNotFound`.
    #[instrument(skip(self, request))]
    pub async fn reorder_roles(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateRolePositionsRequest,
    ) -> ServiceResult<Vec<RoleResponse>> {
        request.validate()?;

        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::ManageRoles)
            .await?;

        let updates: Vec<(Snowflake, i32)> = request
            .positions
            .iter()
            .map(|entry| (entry.id, entry.position))
            .collect();

        self.ctx
            .role_repo()
            .update_positions(guild_id, &updates)
            .await?;

        info!(guild_id = %guild_id, count = updates.len(), "Role positions updated");

        self.ctx
            .publish(DomainEvent::RolesReordered(GuildEvent::new(guild_id)))
            .await;

        let roles = self.ctx.role_repo().find_by_guild(guild_id).await?;
        Ok(roles.into_iter().map(RoleResponse::from).collect())
    }

    /// Load a role, treating a role of another guild as missing
    async fn role_in_guild(&self, guild_id: Snowflake, role_id: Snowflake) -> ServiceResult<Role> {
        self.ctx
            .role_repo()
            .find_by_id(role_id)
            .await?
            .filter(|role| role.guild_id == guild_id)
            .ok_or_else(|| DomainError::RoleNotFound(role_id).into())
    }
}
