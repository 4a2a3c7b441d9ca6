//! Invite service
//!
//! Invite creation and lookup, and the redemption pipeline that turns an
//! invite code into a membership.

use chrono::Utc;
use guild_common::InviteAccounting;
use guild_core::events::{InviteEvent, MemberEvent};
use guild_core::{
    generate_invite_code, DomainError, DomainEvent, GuildAction, GuildMember, Invite, QuotaLimits,
    Snowflake,
};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::dto::{CreateInviteRequest, GuildResponse, InviteResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

const CODE_ATTEMPTS: usize = 3;

pub struct InviteService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> InviteService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create an invite for a guild
    #[instrument(skip(self, request))]
    pub async fn create_invite(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        request: CreateInviteRequest,
    ) -> ServiceResult<InviteResponse> {
        request.validate()?;

        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::CreateInvite)
            .await?;

        let count = self.ctx.invite_repo().count_by_guild(guild_id).await?;
        let limits = self.ctx.quota_limits(actor_id, Some(guild_id)).await?;
        if !QuotaLimits::allows(limits.max_invites_per_guild, count) {
            return Err(DomainError::QuotaExceeded(format!(
                "guild already has {count} invites (limit {})",
                limits.max_invites_per_guild
            ))
            .into());
        }

        let channel_id = request.channel_id.unwrap_or(guild_id);
        let mut attempt = 0;
        let invite = loop {
            attempt += 1;
            let invite = Invite::new(generate_invite_code(), guild_id, channel_id, actor_id)
                .with_max_age(request.max_age_secs)
                .with_max_uses(request.max_uses)
                .with_temporary(request.temporary);

            match self.ctx.invite_repo().create(&invite).await {
                Ok(()) => break invite,
                Err(DomainError::InviteCodeExists) if attempt < CODE_ATTEMPTS => {
                    warn!(attempt, "Invite code collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        };

        info!(
            code = %invite.code,
            guild_id = %guild_id,
            inviter_id = %actor_id,
            max_uses = invite.max_uses,
            "Invite created"
        );

        self.ctx
            .publish(DomainEvent::InviteCreated(InviteEvent::new(
                guild_id,
                &invite.code,
                actor_id,
            )))
            .await;

        Ok(InviteResponse::from(invite))
    }

    #[instrument(skip(self))]
    pub async fn get_invite(&self, code: &str) -> ServiceResult<InviteResponse> {
        Ok(InviteResponse::from(self.find_invite(code).await?))
    }

    /// Invites of a guild, for members allowed to manage it
    #[instrument(skip(self))]
    pub async fn list_invites(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
    ) -> ServiceResult<Vec<InviteResponse>> {
        let guild = self.ctx.require_guild(guild_id).await?;
        PermissionService::new(self.ctx)
            .authorize(&guild, actor_id, GuildAction::ManageGuild)
            .await?;

        let invites = self.ctx.invite_repo().find_by_guild(guild_id).await?;
        Ok(invites.into_iter().map(InviteResponse::from).collect())
    }

    /// Revoke an invite; its creator may always do so
    #[instrument(skip(self))]
    pub async fn delete_invite(&self, code: &str, actor_id: Snowflake) -> ServiceResult<()> {
        let invite = self.find_invite(code).await?;
        if invite.inviter_id != actor_id {
            let guild = self.ctx.require_guild(invite.guild_id).await?;
            PermissionService::new(self.ctx)
                .authorize(&guild, actor_id, GuildAction::ManageGuild)
                .await?;
        }

        self.ctx.invite_repo().delete(code).await?;

        info!(code = %code, guild_id = %invite.guild_id, "Invite deleted");

        self.ctx
            .publish(DomainEvent::InviteDeleted(InviteEvent::new(
                invite.guild_id,
                code,
                invite.inviter_id,
            )))
            .await;

        Ok(())
    }

    /// Join the invite's guild
    ///
    /// Checks run in a fixed order and nothing is written before the first
    /// failing check. The member insert and the use count update run in a
    /// detached unit. Under [`InviteAccounting::Strict`] a use that would
    /// overshoot `max_uses` removes the new member again.
    #[instrument(skip(self))]
    pub async fn redeem(&self, code: &str, user_id: Snowflake) -> ServiceResult<GuildResponse> {
        let now = Utc::now();

        let invite = self.find_invite(code).await?;
        if invite.is_expired_at(now) {
            return Err(DomainError::invite_expired().into());
        }
        if invite.is_exhausted() {
            return Err(DomainError::invite_exhausted().into());
        }

        let guild = self.ctx.require_guild(invite.guild_id).await?;

        let banned = self
            .ctx
            .ban_repo()
            .find(guild.id, user_id)
            .await?
            .is_some_and(|ban| ban.is_active_at(now));
        if banned {
            return Err(DomainError::Banned.into());
        }

        if self.ctx.member_repo().is_member(guild.id, user_id).await? {
            return Err(DomainError::AlreadyMember.into());
        }

        let joined = self.ctx.member_repo().count_by_user(user_id).await?;
        let limits = self.ctx.quota_limits(user_id, Some(guild.id)).await?;
        if !QuotaLimits::allows(limits.max_guilds_joined, joined) {
            return Err(DomainError::QuotaExceeded(format!(
                "user already belongs to {joined} guilds (limit {})",
                limits.max_guilds_joined
            ))
            .into());
        }

        let default_role = self
            .ctx
            .role_repo()
            .find_default(guild.id)
            .await?
            .ok_or_else(|| {
                ServiceError::internal(format!("guild {} has no default role", guild.id))
            })?;

        let member =
            GuildMember::new(guild.id, user_id, default_role.id).with_temporary(invite.temporary);
        let accounting = self.ctx.invite_accounting();
        let invite_code = invite.code.clone();

        self.ctx
            .detached(move |ctx| admit(ctx, member, invite_code, accounting))
            .await?;

        info!(code = %code, guild_id = %guild.id, user_id = %user_id, "Invite redeemed");

        self.ctx
            .publish(DomainEvent::MemberJoined(MemberEvent::via_invite(
                guild.id, user_id, code,
            )))
            .await;

        Ok(GuildResponse::from(guild))
    }

    /// Delete every invite whose expiry has passed, across all guilds
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self) -> ServiceResult<u64> {
        let removed = self.ctx.invite_repo().delete_expired(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "Expired invites removed");
        }
        Ok(removed)
    }

    async fn find_invite(&self, code: &str) -> ServiceResult<Invite> {
        self.ctx
            .invite_repo()
            .find_by_code(code)
            .await?
            .ok_or_else(|| DomainError::InviteNotFound(code.to_string()).into())
    }
}

/// Insert the member and count the invite use
///
/// The insert re-checks for an active ban atomically, which covers a ban
/// landing after the pipeline's own ban check.
async fn admit(
    ctx: ServiceContext,
    member: GuildMember,
    code: String,
    accounting: InviteAccounting,
) -> ServiceResult<()> {
    ctx.member_repo()
        .create_unless_banned(&member, Utc::now())
        .await?;

    match accounting {
        InviteAccounting::Lenient => {
            if let Err(err) = ctx.invite_repo().increment_uses(&code).await {
                warn!(code = %code, error = %err, "Failed to count invite use");
            }
            Ok(())
        }
        InviteAccounting::Strict => match ctx.invite_repo().increment_uses_bounded(&code).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                rollback_join(&ctx, &member).await;
                Err(DomainError::invite_exhausted().into())
            }
            Err(err) => {
                rollback_join(&ctx, &member).await;
                Err(err.into())
            }
        },
    }
}

async fn rollback_join(ctx: &ServiceContext, member: &GuildMember) {
    if let Err(err) = ctx
        .member_repo()
        .delete(member.guild_id, member.user_id)
        .await
    {
        error!(
            guild_id = %member.guild_id,
            user_id = %member.user_id,
            error = %err,
            "Failed to roll back membership"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use guild_core::{Ban, InviteRejection};
    use guild_db::FaultPoint;

    use super::*;
    use crate::adapters::StaticQuotaOracle;
    use crate::dto::CreateBanRequest;
    use crate::services::moderation::ModerationService;
    use crate::services::test_support::{Gate, GatedQuotaOracle, Harness, OTHER, OWNER, USER};

    async fn invite(h: &Harness, guild_id: Snowflake, request: CreateInviteRequest) -> String {
        InviteService::new(&h.ctx)
            .create_invite(guild_id, OWNER, request)
            .await
            .unwrap()
            .code
    }

    #[tokio::test]
    async fn test_redeem_joins_with_default_role() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        let code = invite(&h, guild.id, CreateInviteRequest::default()).await;

        let joined = InviteService::new(&h.ctx).redeem(&code, USER).await.unwrap();
        assert_eq!(joined.id, guild.id);

        let member = h.ctx.member_repo().find(guild.id, USER).await.unwrap().unwrap();
        let default = h.ctx.role_repo().find_default(guild.id).await.unwrap().unwrap();
        assert_eq!(member.role_ids, vec![default.id]);
        assert_eq!(h.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap().uses, 1);
        assert!(h.sink.event_types().contains(&"server.member_joined"));
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let h = Harness::new();
        let err = InviteService::new(&h.ctx).redeem("nope", USER).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::InviteNotFound("nope".to_string())));
    }

    #[tokio::test]
    async fn test_exhausted_invite_rejects_next_user() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        let code = invite(&h, guild.id, CreateInviteRequest::default().with_max_uses(1)).await;
        let service = InviteService::new(&h.ctx);

        service.redeem(&code, USER).await.unwrap();
        let err = service.redeem(&code, OTHER).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::invite_exhausted()));
        assert_eq!(err.error_code(), "INVITE_EXPIRED");
        assert!(!h.ctx.member_repo().is_member(guild.id, OTHER).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_check_precedes_ban_check() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        let mut stale = Invite::new("stale001".to_string(), guild.id, guild.id, OWNER);
        stale.expires_at = Some(Utc::now() - Duration::minutes(1));
        h.ctx.invite_repo().create(&stale).await.unwrap();
        h.ctx
            .ban_repo()
            .save(&Ban::new(guild.id, USER, OWNER))
            .await
            .unwrap();

        let err = InviteService::new(&h.ctx).redeem("stale001", USER).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(DomainError::InviteExpired {
                reason: InviteRejection::Expired
            })
        ));
    }

    #[tokio::test]
    async fn test_banned_and_existing_members_are_refused() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        let code = invite(&h, guild.id, CreateInviteRequest::default()).await;
        h.ctx
            .ban_repo()
            .save(&Ban::new(guild.id, USER, OWNER))
            .await
            .unwrap();
        let service = InviteService::new(&h.ctx);

        let err = service.redeem(&code, USER).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::Banned));

        let err = service.redeem(&code, OWNER).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::AlreadyMember));
        assert_eq!(h.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap().uses, 0);
    }

    #[tokio::test]
    async fn test_ban_landing_mid_redeem_keeps_user_out() {
        let gate = Arc::new(Gate::default());
        let h = Harness::with(|b| b.quota_oracle(Arc::new(GatedQuotaOracle(Arc::clone(&gate)))));
        let guild = h.guild(OWNER).await;
        let code = invite(&h, guild.id, CreateInviteRequest::default()).await;

        gate.arm();
        let pending = {
            let ctx = h.ctx.clone();
            let code = code.clone();
            tokio::spawn(async move { InviteService::new(&ctx).redeem(&code, USER).await })
        };
        gate.reached().await;
        ModerationService::new(&h.ctx)
            .ban(guild.id, USER, OWNER, CreateBanRequest::default())
            .await
            .unwrap();
        gate.release();

        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::Banned));
        assert!(!h.ctx.member_repo().is_member(guild.id, USER).await.unwrap());
        assert_eq!(h.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap().uses, 0);
        assert!(!h.sink.event_types().contains(&"server.member_joined"));
    }

    #[tokio::test]
    async fn test_redeem_cancelled_before_admission_writes_nothing() {
        let gate = Arc::new(Gate::default());
        let h = Harness::with(|b| b.quota_oracle(Arc::new(GatedQuotaOracle(Arc::clone(&gate)))));
        let guild = h.guild(OWNER).await;
        let code = invite(&h, guild.id, CreateInviteRequest::default()).await;

        gate.arm();
        let pending = {
            let ctx = h.ctx.clone();
            let code = code.clone();
            tokio::spawn(async move { InviteService::new(&ctx).redeem(&code, USER).await })
        };
        gate.reached().await;
        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        gate.release();
        tokio::task::yield_now().await;

        assert!(!h.ctx.member_repo().is_member(guild.id, USER).await.unwrap());
        assert_eq!(h.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap().uses, 0);
    }

    #[tokio::test]
    async fn test_dangling_invite_reports_missing_guild() {
        let h = Harness::new();
        let ghost = Snowflake::new(777);
        let orphan = Invite::new("orphan01".to_string(), ghost, ghost, OWNER);
        h.ctx.invite_repo().create(&orphan).await.unwrap();

        let err = InviteService::new(&h.ctx).redeem("orphan01", USER).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::GuildNotFound(ghost)));
    }

    #[tokio::test]
    async fn test_joined_guild_quota() {
        let h = Harness::with(|b| {
            b.quota_oracle(Arc::new(StaticQuotaOracle::new(QuotaLimits {
                max_guilds_joined: 1,
                ..QuotaLimits::UNLIMITED
            })))
        });
        let first = h.guild(OWNER).await;
        let second = h.guild(OTHER).await;
        h.join(first.id, USER).await;
        let code = InviteService::new(&h.ctx)
            .create_invite(second.id, OTHER, CreateInviteRequest::default())
            .await
            .unwrap()
            .code;

        let err = InviteService::new(&h.ctx).redeem(&code, USER).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::QuotaExceeded(_))));
    }

    #[tokio::test]
    async fn test_lenient_accounting_keeps_member_on_count_failure() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        let code = invite(&h, guild.id, CreateInviteRequest::default()).await;
        h.repos.store.fail_next(FaultPoint::IncrementInviteUses);

        InviteService::new(&h.ctx).redeem(&code, USER).await.unwrap();
        assert!(h.ctx.member_repo().is_member(guild.id, USER).await.unwrap());
        assert_eq!(h.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap().uses, 0);
    }

    #[tokio::test]
    async fn test_strict_accounting_rolls_back_on_count_failure() {
        let h = Harness::with(|b| b.invite_accounting(InviteAccounting::Strict));
        let guild = h.guild(OWNER).await;
        let code = invite(&h, guild.id, CreateInviteRequest::default().with_max_uses(1)).await;
        h.repos.store.fail_next(FaultPoint::IncrementInviteUses);

        let err = InviteService::new(&h.ctx).redeem(&code, USER).await.unwrap_err();
        assert!(err.as_domain().is_some_and(DomainError::is_upstream));
        assert!(!h.ctx.member_repo().is_member(guild.id, USER).await.unwrap());
        assert!(!h.sink.event_types().contains(&"server.member_joined"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_strict_accounting_never_overshoots() {
        let h = Harness::with(|b| b.invite_accounting(InviteAccounting::Strict));
        let guild = h.guild(OWNER).await;
        let code = invite(&h, guild.id, CreateInviteRequest::default().with_max_uses(1)).await;

        let mut tasks = Vec::new();
        for n in 0..16 {
            let ctx = h.ctx.clone();
            let code = code.clone();
            tasks.push(tokio::spawn(async move {
                InviteService::new(&ctx)
                    .redeem(&code, Snowflake::new(5000 + n))
                    .await
            }));
        }

        let mut joined = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => joined += 1,
                Err(err) => assert_eq!(err.error_code(), "INVITE_EXPIRED"),
            }
        }

        let stored = h.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap();
        assert_eq!(joined, 1);
        assert_eq!(stored.uses, 1);
    }

    #[tokio::test]
    async fn test_delete_invite_by_inviter_or_manager() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        h.join(guild.id, USER).await;
        let service = InviteService::new(&h.ctx);

        let mine = service
            .create_invite(guild.id, USER, CreateInviteRequest::default())
            .await
            .unwrap();
        let owners = invite(&h, guild.id, CreateInviteRequest::default()).await;

        let err = service.delete_invite(&owners, USER).await.unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::MissingPermission("MANAGE_GUILD".to_string()))
        );

        service.delete_invite(&mine.code, USER).await.unwrap();
        service.delete_invite(&owners, OWNER).await.unwrap();
        assert!(service.list_invites(guild.id, OWNER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        let live = invite(&h, guild.id, CreateInviteRequest::default().never_expires()).await;
        let mut stale = Invite::new("stale002".to_string(), guild.id, guild.id, OWNER);
        stale.expires_at = Some(Utc::now() - Duration::seconds(5));
        h.ctx.invite_repo().create(&stale).await.unwrap();

        let removed = InviteService::new(&h.ctx).sweep_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert!(h.ctx.invite_repo().find_by_code(&live).await.unwrap().is_some());
        assert!(h.ctx.invite_repo().find_by_code("stale002").await.unwrap().is_none());
    }
}
