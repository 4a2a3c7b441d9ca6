//! End-to-end membership scenarios
//!
//! Each scenario runs over the in-memory repositories and, when
//! `DATABASE_URL` is set, again over PostgreSQL.
//!
//! Run with: cargo test -p integration-tests --test scenarios

use guild_core::{DomainError, Permissions};
use guild_service::dto::{CreateBanRequest, CreateRoleRequest};
use guild_service::{
    GuildService, InviteService, MemberService, ModerationService, PermissionService, RoleService,
};
use integration_tests::{domain, World};

async fn create_and_read_back(world: &World) {
    let u1 = world.user();
    let created = world.community(u1).await;

    let fetched = GuildService::new(&world.ctx).get_guild(created.id).await.unwrap();
    assert_eq!(fetched.owner_id, u1);

    let roles = RoleService::new(&world.ctx).list_roles(created.id, u1).await.unwrap();
    let default = roles.iter().find(|r| r.is_default).expect("default role");
    assert_eq!(roles.len(), 1);

    let member = MemberService::new(&world.ctx)
        .get_member(created.id, u1)
        .await
        .unwrap();
    assert_eq!(member.roles, vec![default.id]);
}

async fn single_use_invite(world: &World) {
    let (u1, u2, u3) = (world.user(), world.user(), world.user());
    let guild = world.community(u1).await;
    let code = world.invite(guild.id, u1, 1).await;
    let invites = InviteService::new(&world.ctx);

    invites.redeem(&code, u2).await.unwrap();
    assert!(world.ctx.member_repo().is_member(guild.id, u2).await.unwrap());

    // The spent code is rejected before membership is looked at
    let err = invites.redeem(&code, u2).await.unwrap_err();
    assert!(matches!(domain(err), DomainError::InviteExpired { .. }));

    let open = world.invite(guild.id, u1, 0).await;
    let err = invites.redeem(&open, u2).await.unwrap_err();
    assert_eq!(domain(err), DomainError::AlreadyMember);

    let err = invites.redeem(&code, u3).await.unwrap_err();
    assert!(matches!(domain(err), DomainError::InviteExpired { .. }));
    assert!(!world.ctx.member_repo().is_member(guild.id, u3).await.unwrap());
}

async fn ban_blocks_redemption_until_unban(world: &World) {
    let (u1, u2) = (world.user(), world.user());
    let guild = world.community(u1).await;
    let moderation = ModerationService::new(&world.ctx);
    let invites = InviteService::new(&world.ctx);

    moderation
        .ban(guild.id, u2, u1, CreateBanRequest::default())
        .await
        .unwrap();

    let code = world.invite(guild.id, u1, 0).await;
    let err = invites.redeem(&code, u2).await.unwrap_err();
    assert_eq!(domain(err), DomainError::Banned);

    moderation.unban(guild.id, u2, u1).await.unwrap();
    invites.redeem(&code, u2).await.unwrap();
    assert!(world.ctx.member_repo().is_member(guild.id, u2).await.unwrap());
}

async fn owner_deletes_instead_of_leaving(world: &World) {
    let u1 = world.user();
    let guild = world.community(u1).await;
    let role = RoleService::new(&world.ctx)
        .create_role(guild.id, u1, CreateRoleRequest::named("Temp"))
        .await
        .unwrap();

    let err = MemberService::new(&world.ctx)
        .leave(guild.id, u1)
        .await
        .unwrap_err();
    assert_eq!(domain(err), DomainError::OwnerCannotLeave);

    GuildService::new(&world.ctx)
        .delete_guild(guild.id, u1)
        .await
        .unwrap();

    let err = RoleService::new(&world.ctx).get_role(role.id).await.unwrap_err();
    assert_eq!(domain(err), DomainError::RoleNotFound(role.id));
}

async fn role_bits_are_ored(world: &World) {
    let (u1, u2) = (world.user(), world.user());
    let guild = world.community(u1).await;
    let roles = RoleService::new(&world.ctx);
    let members = MemberService::new(&world.ctx);

    let send = roles
        .create_role(
            guild.id,
            u1,
            CreateRoleRequest::named("Talk").with_permissions(Permissions::SEND_MESSAGES),
        )
        .await
        .unwrap();
    let manage = roles
        .create_role(
            guild.id,
            u1,
            CreateRoleRequest::named("Tidy").with_permissions(Permissions::MANAGE_MESSAGES),
        )
        .await
        .unwrap();

    let code = world.invite(guild.id, u1, 0).await;
    InviteService::new(&world.ctx).redeem(&code, u2).await.unwrap();
    members.add_role(guild.id, u2, send.id, u1).await.unwrap();
    members.add_role(guild.id, u2, manage.id, u1).await.unwrap();

    let effective = PermissionService::new(&world.ctx)
        .member_permissions(guild.id, u2)
        .await
        .unwrap();
    assert_eq!(
        effective,
        world.ctx.baseline_permissions() | Permissions::SEND_MESSAGES | Permissions::MANAGE_MESSAGES
    );
}

macro_rules! scenario {
    ($memory:ident, $postgres:ident, $body:ident) => {
        #[tokio::test]
        async fn $memory() {
            $body(&World::in_memory()).await;
        }

        #[tokio::test]
        async fn $postgres() {
            let Some(world) = World::postgres().await.unwrap() else {
                return;
            };
            $body(&world).await;
        }
    };
}

scenario!(test_create_community_memory, test_create_community_postgres, create_and_read_back);
scenario!(test_single_use_invite_memory, test_single_use_invite_postgres, single_use_invite);
scenario!(
    test_ban_blocks_redemption_memory,
    test_ban_blocks_redemption_postgres,
    ban_blocks_redemption_until_unban
);
scenario!(
    test_owner_delete_memory,
    test_owner_delete_postgres,
    owner_deletes_instead_of_leaving
);
scenario!(test_role_bits_memory, test_role_bits_postgres, role_bits_are_ored);

#[tokio::test]
async fn test_role_bits_with_empty_baseline() {
    let world = World::in_memory_with(|b| b.baseline_permissions(Permissions::empty()));
    role_bits_are_ored(&world).await;
    assert_eq!(world.ctx.baseline_permissions(), Permissions::empty());
}
