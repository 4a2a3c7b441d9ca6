//! Entity to DTO mappers

use guild_core::{Ban, Guild, GuildMember, Invite, Role};

use super::responses::{BanResponse, GuildResponse, InviteResponse, MemberResponse, RoleResponse};

impl From<&Guild> for GuildResponse {
    fn from(guild: &Guild) -> Self {
        Self {
            id: guild.id,
            name: guild.name.clone(),
            owner_id: guild.owner_id,
            icon: guild.icon.clone(),
            banner: guild.banner.clone(),
            description: guild.description.clone(),
            created_at: guild.created_at,
        }
    }
}

impl From<Guild> for GuildResponse {
    fn from(guild: Guild) -> Self {
        Self::from(&guild)
    }
}

impl From<&Role> for RoleResponse {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            guild_id: role.guild_id,
            name: role.name.clone(),
            color: role.color,
            hoist: role.hoist,
            position: role.position,
            permissions: role.permissions,
            mentionable: role.mentionable,
            is_default: role.is_default,
        }
    }
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self::from(&role)
    }
}

impl From<GuildMember> for MemberResponse {
    fn from(member: GuildMember) -> Self {
        Self {
            guild_id: member.guild_id,
            user_id: member.user_id,
            nickname: member.nickname,
            roles: member.role_ids,
            temporary: member.temporary,
            joined_at: member.joined_at,
        }
    }
}

impl From<Ban> for BanResponse {
    fn from(ban: Ban) -> Self {
        Self {
            user_id: ban.user_id,
            moderator_id: ban.moderator_id,
            reason: ban.reason,
            expires_at: ban.expires_at,
            created_at: ban.created_at,
        }
    }
}

impl From<&Invite> for InviteResponse {
    fn from(invite: &Invite) -> Self {
        Self {
            code: invite.code.clone(),
            guild_id: invite.guild_id,
            channel_id: invite.channel_id,
            inviter_id: invite.inviter_id,
            uses: invite.uses,
            max_uses: invite.max_uses,
            temporary: invite.temporary,
            created_at: invite.created_at,
            expires_at: invite.expires_at,
        }
    }
}

impl From<Invite> for InviteResponse {
    fn from(invite: Invite) -> Self {
        Self::from(&invite)
    }
}
