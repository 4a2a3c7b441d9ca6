//! Member service
//!
//! Leaving, listing, nicknames and role assignment for guild members.

use guild_core::events::MemberEvent;
use guild_core::{DomainError, DomainEvent, GuildAction, GuildMember, Role, Snowflake};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{ListMembersRequest, MemberResponse, PaginatedResponse, UpdateNicknameRequest};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::permission::PermissionService;

pub struct MemberService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MemberService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Leave a guild
    ///
    /// The owner must transfer ownership before leaving.
    #[instrument(skip(self))]
    pub async fn leave(&self, guild_id: Snowflake, user_id: Snowflake) -> ServiceResult<()> {
        let guild = self.ctx.require_guild(guild_id).await?;
        if guild.is_owner(user_id) {
            return Err(DomainError::OwnerCannotLeave.into());
        }

        if !self.ctx.member_repo().delete(guild_id, user_id).await? {
            return Err(DomainError::NotMember.into());
        }

        info!(guild_id = %guild_id, user_id = %user_id, "User left guild");

        self.ctx
            .publish(DomainEvent::MemberLeft(MemberEvent::new(guild_id, user_id)))
            .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<MemberResponse> {
        Ok(MemberResponse::from(self.find_member(guild_id, user_id).await?))
    }

    /// Page through members in user id order
    #[instrument(skip(self, request))]
    pub async fn list_members(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        request: ListMembersRequest,
    ) -> ServiceResult<PaginatedResponse<MemberResponse>> {
        request.validate()?;

        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .require_member(&guild, actor_id)
            .await?;

        // One extra row tells whether another page exists
        let mut members = self
            .ctx
            .member_repo()
            .find_by_guild(guild_id, request.limit + 1, request.after)
            .await?;

        let has_more = members.len() > request.limit as usize;
        members.truncate(request.limit as usize);
        let next = if has_more {
            members.last().map(|member| member.user_id)
        } else {
            None
        };

        Ok(PaginatedResponse::new(
            members.into_iter().map(MemberResponse::from).collect(),
            next,
            has_more,
            request.limit,
        ))
    }

    /// Change a nickname; members may always change their own
    #[instrument(skip(self, request))]
    pub async fn set_nickname(
        &self,
        guild_id: Snowflake,
        target_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateNicknameRequest,
    ) -> ServiceResult<MemberResponse> {
        request.validate()?;

        let guild = self.ctx.require_guild(guild_id).await?;
        let permissions = PermissionService::new(self.ctx);
        if actor_id == target_id {
            permissions.require_member(&guild, actor_id).await?;
        } else {
            permissions
                .authorize(&guild, actor_id, GuildAction::ManageNicknames)
                .await?;
        }

        let mut member = self.find_member(guild_id, target_id).await?;
        member.set_nickname(request.nickname);
        self.ctx.member_repo().update(&member).await?;

        self.publish_updated(guild_id, target_id).await;

        Ok(MemberResponse::from(member))
    }

    /// Assign a role of this guild to a member
    #[instrument(skip(self))]
    pub async fn add_role(
        &self,
        guild_id: Snowflake,
        target_id: Snowflake,
        role_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<()> {
        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::ManageRoles)
            .await?;

        self.guild_role(guild_id, role_id).await?;
        self.ctx
            .member_repo()
            .add_role(guild_id, target_id, role_id)
            .await?;

        info!(guild_id = %guild_id, user_id = %target_id, role_id = %role_id, "Role added to member");

        self.publish_updated(guild_id, target_id).await;
        Ok(())
    }

    /// Take a role away from a member; the default role stays
    #[instrument(skip(self))]
    pub async fn remove_role(
        &self,
        guild_id: Snowflake,
        target_id: Snowflake,
        role_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<()> {
        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::ManageRoles)
            .await?;

        let role = self.guild_role(guild_id, role_id).await?;
        if role.is_default {
            return Err(DomainError::CannotModifyDefaultRole.into());
        }

        self.find_member(guild_id, target_id).await?;
        self.ctx
            .member_repo()
            .remove_role(guild_id, target_id, role_id)
            .await?;

        info!(guild_id = %guild_id, user_id = %target_id, role_id = %role_id, "Role removed from member");

        self.publish_updated(guild_id, target_id).await;
        Ok(())
    }

    async fn find_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<GuildMember> {
        self.ctx
            .member_repo()
            .find(guild_id, user_id)
            .await?
            .ok_or_else(|| DomainError::MemberNotFound.into())
    }

    async fn guild_role(&self, guild_id: Snowflake, role_id: Snowflake) -> ServiceResult<Role> {
        self.ctx
            .role_repo()
            .find_by_id(role_id)
            .await?
            .filter(|role| role.guild_id == guild_id)
            .ok_or_else(|| DomainError::RoleNotFound(role_id).into())
    }

    async fn publish_updated(&self, guild_id: Snowflake, user_id: Snowflake) {
        self.ctx
            .publish(DomainEvent::MemberUpdated(MemberEvent::new(guild_id, user_id)))
            .await;
    }
}
