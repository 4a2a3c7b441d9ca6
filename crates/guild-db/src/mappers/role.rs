//! Role entity <-> model mapper

use guild_core::entities::Role;
use guild_core::value_objects::{Permissions, Snowflake};

use crate::models::RoleModel;

impl From<RoleModel> for Role {
    fn from(model: RoleModel) -> Self {
        Role {
            id: Snowflake::new(model.id),
            guild_id: Snowflake::new(model.guild_id),
            name: model.name,
            color: model.color,
            hoist: model.hoist,
            position: model.position,
            permissions: Permissions::from_i64(model.permissions),
            mentionable: model.mentionable,
            is_default: model.is_default,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
