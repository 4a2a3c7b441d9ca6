//! Access policy - decides whether a member may perform a guild action
//!
//! Membership of the actor and the owner invariants are checked by the
//! service layer before a policy is consulted. Policies only answer the
//! fine-grained question.

use std::fmt;

use crate::value_objects::{Permissions, Snowflake};

/// Guild-scoped actions gated by an [`AccessPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuildAction {
    ManageRoles,
    KickMembers,
    BanMembers,
    CreateInvite,
    ManageGuild,
    ManageNicknames,
}

impl GuildAction {
    /// Permission bit that grants this action
    pub fn required_permission(self) -> Permissions {
        match self {
            Self::ManageRoles => Permissions::MANAGE_ROLES,
            Self::KickMembers => Permissions::KICK_MEMBERS,
            Self::BanMembers => Permissions::BAN_MEMBERS,
            Self::CreateInvite => Permissions::CREATE_INVITE,
            Self::ManageGuild => Permissions::MANAGE_GUILD,
            Self::ManageNicknames => Permissions::MANAGE_NICKNAMES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageRoles => "MANAGE_ROLES",
            Self::KickMembers => "KICK_MEMBERS",
            Self::BanMembers => "BAN_MEMBERS",
            Self::CreateInvite => "CREATE_INVITE",
            Self::ManageGuild => "MANAGE_GUILD",
            Self::ManageNicknames => "MANAGE_NICKNAMES",
        }
    }
}

impl fmt::Display for GuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a policy may look at
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest {
    pub guild_id: Snowflake,
    pub owner_id: Snowflake,
    pub actor_id: Snowflake,
    /// Output of `Permissions::effective` for the actor
    pub effective: Permissions,
    pub action: GuildAction,
}

pub trait AccessPolicy: Send + Sync {
    fn permits(&self, request: &AccessRequest) -> bool;

    fn name(&self) -> &'static str;
}

/// Any current member may perform any action
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipOnlyPolicy;

impl AccessPolicy for MembershipOnlyPolicy {
    fn permits(&self, _request: &AccessRequest) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "membership-only"
    }
}

/// The action's permission bit must be present in the effective permissions
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionBitsPolicy;

impl AccessPolicy for PermissionBitsPolicy {
    fn permits(&self, request: &AccessRequest) -> bool {
        request.actor_id == request.owner_id
            || request.effective.has(request.action.required_permission())
    }

    fn name(&self) -> &'static str {
        "permission-bits"
    }
}
