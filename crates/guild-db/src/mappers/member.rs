//! GuildMember entity <-> model mapper

use guild_core::entities::GuildMember;
use guild_core::value_objects::Snowflake;

use crate::models::GuildMemberModel;

/// Assemble a member from its row and its ordered `member_roles` ids
pub fn member_with_roles(model: GuildMemberModel, role_ids: Vec<i64>) -> GuildMember {
    GuildMember {
        guild_id: Snowflake::new(model.guild_id),
        user_id: Snowflake::new(model.user_id),
        nickname: model.nickname,
        role_ids: role_ids.into_iter().map(Snowflake::new).collect(),
        temporary: model.temporary,
        joined_at: model.joined_at,
        updated_at: model.updated_at,
    }
}
