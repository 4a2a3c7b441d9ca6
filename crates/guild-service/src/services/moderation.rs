//! Moderation service
//!
//! Kicks, bans and unbans. A user is never both a member and actively
//! banned: banning removes the membership first.

use chrono::Utc;
use guild_core::events::ModerationEvent;
use guild_core::{Ban, DomainError, DomainEvent, Guild, GuildAction, Snowflake};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{BanResponse, CreateBanRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

pub struct ModerationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ModerationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Remove a member without banning them
    #[instrument(skip(self))]
    pub async fn kick(
        &self,
        guild_id: Snowflake,
        target_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<()> {
        let guild = self
            .moderated_guild(guild_id, target_id, actor_id, GuildAction::KickMembers)
            .await?;

        if !self.ctx.member_repo().delete(guild.id, target_id).await? {
            return Err(DomainError::MemberNotFound.into());
        }

        info!(guild_id = %guild_id, user_id = %target_id, moderator_id = %actor_id, "Member kicked");

        self.ctx
            .publish(DomainEvent::MemberKicked(ModerationEvent::new(
                guild_id, target_id, actor_id,
            )))
            .await;

        Ok(())
    }

    /// Ban a user, removing their membership if they have one
    ///
    /// An expired ban record is replaced; an active one is left untouched.
    #[instrument(skip(self, request))]
    pub async fn ban(
        &self,
        guild_id: Snowflake,
        target_id: Snowflake,
        actor_id: Snowflake,
        request: CreateBanRequest,
    ) -> ServiceResult<BanResponse> {
        request.validate()?;
        let now = Utc::now();
        if request.expires_at.is_some_and(|at| at <= now) {
            return Err(ServiceError::validation("Ban expiry must be in the future"));
        }

        let guild = self
            .moderated_guild(guild_id, target_id, actor_id, GuildAction::BanMembers)
            .await?;

        if let Some(existing) = self.ctx.ban_repo().find(guild.id, target_id).await? {
            if existing.is_active_at(now) {
                return Err(DomainError::AlreadyBanned.into());
            }
        }

        let ban = Ban::new(guild_id, target_id, actor_id)
            .with_reason(request.reason)
            .with_expiry(request.expires_at);

        let ban = self.ctx.detached(move |ctx| store_ban(ctx, ban)).await?;

        info!(
            guild_id = %guild_id,
            user_id = %target_id,
            moderator_id = %actor_id,
            permanent = ban.is_permanent(),
            "Member banned"
        );

        self.ctx
            .publish(DomainEvent::MemberBanned(
                ModerationEvent::new(guild_id, target_id, actor_id).with_reason(ban.reason.clone()),
            ))
            .await;

        Ok(BanResponse::from(ban))
    }

    /// Lift an active ban
    #[instrument(skip(self))]
    pub async fn unban(
        &self,
        guild_id: Snowflake,
        target_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<()> {
        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::BanMembers)
            .await?;

        let active = self
            .ctx
            .ban_repo()
            .find(guild_id, target_id)
            .await?
            .is_some_and(|ban| ban.is_active());
        if !active {
            return Err(DomainError::BanNotFound.into());
        }

        self.ctx.ban_repo().delete(guild_id, target_id).await?;

        info!(guild_id = %guild_id, user_id = %target_id, moderator_id = %actor_id, "Member unbanned");

        self.ctx
            .publish(DomainEvent::MemberUnbanned(ModerationEvent::new(
                guild_id, target_id, actor_id,
            )))
            .await;

        Ok(())
    }

    /// Active bans of a guild, newest first
    #[instrument(skip(self))]
    pub async fn list_bans(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<Vec<BanResponse>> {
        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::BanMembers)
            .await?;

        let now = Utc::now();
        let bans = self.ctx.ban_repo().find_by_guild(guild_id).await?;
        Ok(bans
            .into_iter()
            .filter(|ban| ban.is_active_at(now))
            .map(BanResponse::from)
            .collect())
    }

    /// Owner protection comes before the actor's authorization
    async fn moderated_guild(
        &self,
        guild_id: Snowflake,
        target_id: Snowflake,
        actor_id: Snowflake,
        action: GuildAction,
    ) -> ServiceResult<Guild> {
        let guild = self.ctx.require_guild(guild_id).await?;
        if guild.is_owner(target_id) {
            return Err(DomainError::CannotActOnOwner.into());
        }
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, action)
            .await?;
        Ok(guild)
    }
}

/// Store the ban and drop any membership in one write
async fn store_ban(ctx: ServiceContext, ban: Ban) -> ServiceResult<Ban> {
    ctx.ban_repo().ban_member(&ban).await?;
    Ok(ban)
}
