//! Cross-service properties of the membership core
//!
//! Run with: cargo test -p integration-tests --test properties

use std::sync::Arc;

use guild_common::InviteAccounting;
use guild_core::{DomainError, MembershipOnlyPolicy, Permissions};
use guild_db::FaultPoint;
use guild_service::dto::{CreateBanRequest, CreateGuildRequest, CreateRoleRequest};
use guild_service::{
    GuildService, InviteService, MemberService, ModerationService, PermissionService, RoleService,
};
use integration_tests::{domain, World};

#[tokio::test]
async fn test_owner_holds_all_permissions_after_transfer() {
    let world = World::in_memory();
    let (u1, u2) = (world.user(), world.user());
    let guild = world.community(u1).await;
    let code = world.invite(guild.id, u1, 0).await;
    InviteService::new(&world.ctx).redeem(&code, u2).await.unwrap();

    GuildService::new(&world.ctx)
        .transfer_ownership(guild.id, u1, u2)
        .await
        .unwrap();

    let permissions = PermissionService::new(&world.ctx);
    assert_eq!(
        permissions.member_permissions(guild.id, u2).await.unwrap(),
        Permissions::ALL
    );
    assert_eq!(
        permissions.member_permissions(guild.id, u1).await.unwrap(),
        Permissions::DEFAULT
    );

    // The former owner may now leave; the new owner may not
    let members = MemberService::new(&world.ctx);
    let err = members.leave(guild.id, u2).await.unwrap_err();
    assert_eq!(domain(err), DomainError::OwnerCannotLeave);
    members.leave(guild.id, u1).await.unwrap();
}

#[tokio::test]
async fn test_administrator_role_grants_every_action() {
    let world = World::in_memory();
    let (u1, u2, u3) = (world.user(), world.user(), world.user());
    let guild = world.community(u1).await;
    let code = world.invite(guild.id, u1, 0).await;
    let invites = InviteService::new(&world.ctx);
    invites.redeem(&code, u2).await.unwrap();
    invites.redeem(&code, u3).await.unwrap();

    let admin = RoleService::new(&world.ctx)
        .create_role(
            guild.id,
            u1,
            CreateRoleRequest::named("Admin").with_permissions(Permissions::ADMINISTRATOR),
        )
        .await
        .unwrap();
    MemberService::new(&world.ctx)
        .add_role(guild.id, u2, admin.id, u1)
        .await
        .unwrap();

    ModerationService::new(&world.ctx)
        .ban(guild.id, u3, u2, CreateBanRequest::default())
        .await
        .unwrap();
    assert!(!world.ctx.member_repo().is_member(guild.id, u3).await.unwrap());
}

#[tokio::test]
async fn test_default_role_survives_everything_but_guild_deletion() {
    let world = World::in_memory();
    let (u1, u2) = (world.user(), world.user());
    let guild = world.community(u1).await;
    let code = world.invite(guild.id, u1, 0).await;
    InviteService::new(&world.ctx).redeem(&code, u2).await.unwrap();
    let default = world.ctx.role_repo().find_default(guild.id).await.unwrap().unwrap();

    let err = RoleService::new(&world.ctx)
        .delete_role(guild.id, default.id, u1)
        .await
        .unwrap_err();
    assert_eq!(domain(err), DomainError::CannotDeleteDefaultRole);

    let err = MemberService::new(&world.ctx)
        .remove_role(guild.id, u2, default.id, u1)
        .await
        .unwrap_err();
    assert_eq!(domain(err), DomainError::CannotModifyDefaultRole);

    let member = world.ctx.member_repo().find(guild.id, u2).await.unwrap().unwrap();
    assert!(member.has_role(default.id));
}

#[tokio::test]
async fn test_finite_invite_never_exceeds_max_uses() {
    let world = World::in_memory();
    let owner = world.user();
    let guild = world.community(owner).await;
    let code = world.invite(guild.id, owner, 3).await;
    let invites = InviteService::new(&world.ctx);

    let mut joined = 0;
    for _ in 0..6 {
        if invites.redeem(&code, world.user()).await.is_ok() {
            joined += 1;
        }
    }

    let stored = world.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap();
    assert_eq!(joined, 3);
    assert_eq!(stored.uses, 3);
}

#[tokio::test]
async fn test_unlimited_invite_keeps_counting() {
    let world = World::in_memory();
    let owner = world.user();
    let guild = world.community(owner).await;
    let code = world.invite(guild.id, owner, 0).await;
    let invites = InviteService::new(&world.ctx);

    for _ in 0..25 {
        invites.redeem(&code, world.user()).await.unwrap();
    }

    let stored = world.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap();
    assert_eq!(stored.uses, 25);
}

#[tokio::test]
async fn test_banned_user_is_never_a_member() {
    let world = World::in_memory();
    let (u1, u2) = (world.user(), world.user());
    let guild = world.community(u1).await;
    let code = world.invite(guild.id, u1, 0).await;
    let invites = InviteService::new(&world.ctx);
    invites.redeem(&code, u2).await.unwrap();

    ModerationService::new(&world.ctx)
        .ban(guild.id, u2, u1, CreateBanRequest::default())
        .await
        .unwrap();

    assert!(!world.ctx.member_repo().is_member(guild.id, u2).await.unwrap());
    let err = invites.redeem(&code, u2).await.unwrap_err();
    assert_eq!(domain(err), DomainError::Banned);
    assert!(!world.ctx.member_repo().is_member(guild.id, u2).await.unwrap());
}

#[tokio::test]
async fn test_guild_and_role_are_created_together_or_not_at_all() {
    let world = World::in_memory();
    let owner = world.user();
    if let Some(repos) = &world.repos {
        repos.store.fail_next(FaultPoint::CreateRole);
    }

    let err = GuildService::new(&world.ctx)
        .create_guild(owner, CreateGuildRequest::named("Half"))
        .await
        .unwrap_err();
    assert!(domain(err).is_upstream());

    assert!(world.ctx.guild_repo().find_by_user(owner).await.unwrap().is_empty());
    assert_eq!(world.ctx.guild_repo().count_owned_by(owner).await.unwrap(), 0);
    assert!(world.sink.events().is_empty());
}

#[tokio::test]
async fn test_failed_compensation_still_reports_original_error() {
    let world = World::in_memory();
    let owner = world.user();
    if let Some(repos) = &world.repos {
        repos.store.fail_next(FaultPoint::CreateRole);
        repos.store.fail_next(FaultPoint::DeleteGuild);
    }

    let err = GuildService::new(&world.ctx)
        .create_guild(owner, CreateGuildRequest::named("Stranded"))
        .await
        .unwrap_err();
    assert_eq!(
        domain(err),
        DomainError::DatabaseError("injected fault: CreateRole".to_string())
    );
}

#[tokio::test]
async fn test_strict_accounting_rolls_back_member_insert() {
    let world = World::in_memory_with(|b| b.invite_accounting(InviteAccounting::Strict));
    let (u1, u2) = (world.user(), world.user());
    let guild = world.community(u1).await;
    let code = world.invite(guild.id, u1, 2).await;
    if let Some(repos) = &world.repos {
        repos.store.fail_next(FaultPoint::IncrementInviteUses);
    }

    assert!(InviteService::new(&world.ctx).redeem(&code, u2).await.is_err());
    assert!(!world.ctx.member_repo().is_member(guild.id, u2).await.unwrap());

    InviteService::new(&world.ctx).redeem(&code, u2).await.unwrap();
    let stored = world.ctx.invite_repo().find_by_code(&code).await.unwrap().unwrap();
    assert_eq!(stored.uses, 1);
}

#[tokio::test]
async fn test_membership_only_policy_lets_members_moderate() {
    let world = World::in_memory_with(|b| b.access_policy(Arc::new(MembershipOnlyPolicy)));
    let (u1, u2, u3) = (world.user(), world.user(), world.user());
    let guild = world.community(u1).await;
    let code = world.invite(guild.id, u1, 0).await;
    let invites = InviteService::new(&world.ctx);
    invites.redeem(&code, u2).await.unwrap();
    invites.redeem(&code, u3).await.unwrap();

    ModerationService::new(&world.ctx)
        .kick(guild.id, u3, u2)
        .await
        .unwrap();

    // Outsiders are still refused
    let outsider = world.user();
    let err = ModerationService::new(&world.ctx)
        .kick(guild.id, u2, outsider)
        .await
        .unwrap_err();
    assert_eq!(domain(err), DomainError::NotMember);
}

#[tokio::test]
async fn test_events_follow_committed_changes() {
    let world = World::in_memory();
    let (u1, u2) = (world.user(), world.user());
    let guild = world.community(u1).await;
    let code = world.invite(guild.id, u1, 0).await;
    InviteService::new(&world.ctx).redeem(&code, u2).await.unwrap();
    ModerationService::new(&world.ctx)
        .kick(guild.id, u2, u1)
        .await
        .unwrap();
    GuildService::new(&world.ctx)
        .delete_guild(guild.id, u1)
        .await
        .unwrap();

    assert_eq!(
        world.sink.event_types(),
        vec![
            "community.created",
            "invite.created",
            "server.member_joined",
            "server.member_kicked",
            "community.deleted",
        ]
    );
}
