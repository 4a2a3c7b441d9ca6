//! Guild service
//!
//! Guild lifecycle: creation with its default role and owner membership,
//! settings updates, ownership transfer and deletion.

use guild_core::events::{GuildEvent, OwnershipEvent};
use guild_core::{
    DomainError, DomainEvent, Guild, GuildAction, GuildMember, QuotaLimits, Role, Snowflake,
};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::dto::{CreateGuildRequest, GuildResponse, UpdateGuildRequest};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::permission::PermissionService;

pub struct GuildService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> GuildService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a guild owned by `owner_id`
    ///
    /// The guild, its default role and the owner's membership are written in
    /// a detached unit. If the default role or the owner membership cannot be
    /// stored the guild record is deleted again before the error is returned.
    #[instrument(skip(self, request))]
    pub async fn create_guild(
        &self,
        owner_id: Snowflake,
        request: CreateGuildRequest,
    ) -> ServiceResult<GuildResponse> {
        request.validate()?;

        let owned = self.ctx.guild_repo().count_owned_by(owner_id).await?;
        let limits = self.ctx.quota_limits(owner_id, None).await?;
        if !QuotaLimits::allows(limits.max_guilds_owned, owned) {
            return Err(DomainError::QuotaExceeded(format!(
                "user already owns {owned} guilds (limit {})",
                limits.max_guilds_owned
            ))
            .into());
        }

        let mut guild = Guild::new(self.ctx.generate_id(), request.name, owner_id);
        guild.set_icon(request.icon);
        guild.set_description(request.description);
        let default_role = Role::default_for(
            self.ctx.generate_id(),
            guild.id,
            self.ctx.baseline_permissions(),
        );

        let guild = self
            .ctx
            .detached(move |ctx| seed_guild(ctx, guild, default_role))
            .await?;

        info!(guild_id = %guild.id, owner_id = %owner_id, "Guild created");

        self.ctx
            .publish(DomainEvent::CommunityCreated(OwnershipEvent::created(
                guild.id, owner_id,
            )))
            .await;

        Ok(GuildResponse::from(&guild))
    }

    #[instrument(skip(self))]
    pub async fn get_guild(&self, guild_id: Snowflake) -> ServiceResult<GuildResponse> {
        let guild = self.ctx.require_guild(guild_id).await?;
        Ok(GuildResponse::from(&guild))
    }

    /// Guilds `user_id` currently belongs to
    #[instrument(skip(self))]
    pub async fn list_user_guilds(&self, user_id: Snowflake) -> ServiceResult<Vec<GuildResponse>> {
        let guilds = self.ctx.guild_repo().find_by_user(user_id).await?;
        Ok(guilds.into_iter().map(GuildResponse::from).collect())
    }

    /// Patch guild settings
    #[instrument(skip(self, request))]
    pub async fn update_guild(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        request: UpdateGuildRequest,
    ) -> ServiceResult<GuildResponse> {
        request.validate()?;

        let mut guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::ManageGuild)
            .await?;

        if request.is_empty() {
            return Ok(GuildResponse::from(&guild));
        }

        if let Some(name) = request.name {
            guild.set_name(name);
        }
        if let Some(icon) = request.icon {
            guild.set_icon(non_empty(icon));
        }
        if let Some(banner) = request.banner {
            guild.set_banner(non_empty(banner));
        }
        if let Some(description) = request.description {
            guild.set_description(non_empty(description));
        }

        self.ctx.guild_repo().update(&guild).await?;

        info!(guild_id = %guild_id, "Guild updated");

        self.ctx
            .publish(DomainEvent::CommunityUpdated(GuildEvent::new(guild_id)))
            .await;

        Ok(GuildResponse::from(&guild))
    }

    /// Hand the guild to another current member
    #[instrument(skip(self))]
    pub async fn transfer_ownership(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        new_owner_id: Snowflake,
    ) -> ServiceResult<GuildResponse> {
        let mut guild = self.ctx.require_guild(guild_id).await?;
        if !guild.is_owner(actor_id) {
            return Err(DomainError::NotOwner.into());
        }
        if !self.ctx.member_repo().is_member(guild_id, new_owner_id).await? {
            return Err(DomainError::NotMember.into());
        }

        guild.transfer_ownership(new_owner_id);
        self.ctx.guild_repo().update(&guild).await?;

        info!(
            guild_id = %guild_id,
            old_owner = %actor_id,
            new_owner = %new_owner_id,
            "Guild ownership transferred"
        );

        self.ctx
            .publish(DomainEvent::OwnerTransferred(OwnershipEvent::transferred(
                guild_id,
                actor_id,
                new_owner_id,
            )))
            .await;

        Ok(GuildResponse::from(&guild))
    }

    /// Delete a guild; only its owner may do so
    #[instrument(skip(self))]
    pub async fn delete_guild(&self, guild_id: Snowflake, actor_id: Snowflake) -> ServiceResult<()> {
        let guild = self.ctx.require_guild(guild_id).await?;
        if !guild.is_owner(actor_id) {
            return Err(DomainError::NotOwner.into());
        }

        self.ctx.guild_repo().delete(guild_id).await?;

        info!(guild_id = %guild_id, "Guild deleted");

        self.ctx
            .publish(DomainEvent::CommunityDeleted(GuildEvent::new(guild_id)))
            .await;

        Ok(())
    }
}

/// Guild row, default role and owner membership
async fn seed_guild(ctx: ServiceContext, guild: Guild, default_role: Role) -> ServiceResult<Guild> {
    ctx.guild_repo().create(&guild).await?;

    if let Err(err) = ctx.role_repo().create(&default_role).await {
        discard_guild(&ctx, guild.id, "default role").await;
        return Err(err.into());
    }

    if let Err(err) = ctx.provision_channels(&guild).await {
        warn!(guild_id = %guild.id, error = %err, "Channel provisioning failed");
    }

    let owner = GuildMember::new(guild.id, guild.owner_id, default_role.id);
    if let Err(err) = ctx.member_repo().create(&owner).await {
        discard_guild(&ctx, guild.id, "owner membership").await;
        return Err(err.into());
    }

    Ok(guild)
}

/// Undo a partially seeded guild; its roles go with it
async fn discard_guild(ctx: &ServiceContext, guild_id: Snowflake, failed_step: &'static str) {
    if let Err(cleanup) = ctx.guild_repo().delete(guild_id).await {
        error!(
            guild_id = %guild_id,
            failed_step,
            error = %cleanup,
            "Failed to remove partially created guild"
        );
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
