//! Permission service
//!
//! Resolves effective permissions and gates guild actions through the
//! configured [`AccessPolicy`](guild_core::AccessPolicy).

use guild_core::{AccessRequest, DomainError, Guild, GuildAction, Permissions, Snowflake};
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

pub struct PermissionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PermissionService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Effective permissions of `user_id` in `guild_id`
    #[instrument(skip(self))]
    pub async fn member_permissions(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Permissions> {
        let guild = self.ctx.require_guild(guild_id).await?;
        self.effective(&guild, user_id).await
    }

    /// Effective permissions for an already loaded guild
    ///
    /// The owner short-circuits before any member lookup. Anyone else must be
    /// a member (`NotMember`).
    pub async fn effective(&self, guild: &Guild, user_id: Snowflake) -> ServiceResult<Permissions> {
        if guild.is_owner(user_id) {
            return Ok(Permissions::ALL);
        }

        let member = self
            .ctx
            .member_repo()
            .find(guild.id, user_id)
            .await?
            .ok_or(DomainError::NotMember)?;

        let roles = self.ctx.role_repo().find_by_guild(guild.id).await?;
        let masks = roles
            .iter()
            .filter(|role| role.is_default || member.has_role(role.id))
            .map(|role| role.permissions);

        let permissions = Permissions::effective(guild.owner_id, user_id, masks);
        debug!(
            user_id = %user_id,
            guild_id = %guild.id,
            permissions = %permissions,
            "Computed member permissions"
        );
        Ok(permissions)
    }

    /// Require `actor_id` to be a member allowed to perform `action`
    ///
    /// Fails with `NotMember` for non-members and `MissingPermission` when
    /// the access policy refuses.
    #[instrument(skip(self, guild), fields(guild_id = %guild.id))]
    pub async fn authorize(
        &self,
        guild: &Guild,
        actor_id: Snowflake,
        action: GuildAction,
    ) -> ServiceResult<()> {
        let effective = self.effective(guild, actor_id).await?;
        let request = AccessRequest {
            guild_id: guild.id,
            owner_id: guild.owner_id,
            actor_id,
            effective,
            action,
        };

        let policy = self.ctx.access_policy();
        if !policy.permits(&request) {
            debug!(actor_id = %actor_id, %action, policy = policy.name(), "Access denied");
            return Err(DomainError::MissingPermission(action.to_string()).into());
        }
        Ok(())
    }

    /// Require `user_id` to be a current member, without consulting the policy
    pub async fn require_member(&self, guild: &Guild, user_id: Snowflake) -> ServiceResult<()> {
        if guild.is_owner(user_id) || self.ctx.member_repo().is_member(guild.id, user_id).await? {
            Ok(())
        } else {
            Err(DomainError::NotMember.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use guild_core::{MembershipOnlyPolicy, Role};

    use super::*;
    use crate::dto::CreateRoleRequest;
    use crate::services::test_support::{Harness, OWNER, USER};
    use crate::services::RoleService;

    #[tokio::test]
    async fn test_owner_gets_all_without_roles() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;

        let perms = PermissionService::new(&h.ctx)
            .member_permissions(guild.id, OWNER)
            .await
            .unwrap();
        assert_eq!(perms, Permissions::ALL);
    }

    #[tokio::test]
    async fn test_member_gets_default_role_baseline() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        h.join(guild.id, USER).await;

        let perms = PermissionService::new(&h.ctx)
            .member_permissions(guild.id, USER)
            .await
            .unwrap();
        assert_eq!(perms, Permissions::DEFAULT);
    }

    #[tokio::test]
    async fn test_roles_are_ored_and_administrator_absorbs() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        h.join(guild.id, USER).await;

        let roles = RoleService::new(&h.ctx);
        let kick = roles
            .create_role(
                guild.id,
                OWNER,
                CreateRoleRequest::named("Kick").with_permissions(Permissions::KICK_MEMBERS),
            )
            .await
            .unwrap();
        h.ctx.member_repo().add_role(guild.id, USER, kick.id).await.unwrap();

        let perms = PermissionService::new(&h.ctx)
            .member_permissions(guild.id, USER)
            .await
            .unwrap();
        assert_eq!(perms, Permissions::DEFAULT | Permissions::KICK_MEMBERS);

        let admin = Role::new(
            h.ctx.generate_id(),
            guild.id,
            "Admin".to_string(),
            Permissions::ADMINISTRATOR,
        );
        h.ctx.role_repo().create(&admin).await.unwrap();
        h.ctx.member_repo().add_role(guild.id, USER, admin.id).await.unwrap();

        let perms = PermissionService::new(&h.ctx)
            .member_permissions(guild.id, USER)
            .await
            .unwrap();
        assert_eq!(perms, Permissions::ALL);
    }

    #[tokio::test]
    async fn test_authorize_rejects_non_member_then_missing_bit() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        let service = PermissionService::new(&h.ctx);

        let err = service
            .authorize(&guild, USER, GuildAction::KickMembers)
            .await
            .unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::NotMember));

        h.join(guild.id, USER).await;
        let err = service
            .authorize(&guild, USER, GuildAction::KickMembers)
            .await
            .unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::MissingPermission("KICK_MEMBERS".to_string()))
        );
        assert!(service.authorize(&guild, USER, GuildAction::CreateInvite).await.is_ok());
        assert!(service.authorize(&guild, OWNER, GuildAction::ManageGuild).await.is_ok());
    }

    #[tokio::test]
    async fn test_membership_only_policy_permits_any_member() {
        let h = Harness::with(|b| b.access_policy(Arc::new(MembershipOnlyPolicy)));
        let guild = h.guild(OWNER).await;
        h.join(guild.id, USER).await;

        assert!(PermissionService::new(&h.ctx)
            .authorize(&guild, USER, GuildAction::BanMembers)
            .await
            .is_ok());
    }
}
