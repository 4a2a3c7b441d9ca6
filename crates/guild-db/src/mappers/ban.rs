//! Ban entity <-> model mapper

use guild_core::entities::Ban;
use guild_core::value_objects::Snowflake;

use crate::models::BanModel;

impl From<BanModel> for Ban {
    fn from(model: BanModel) -> Self {
        Ban {
            guild_id: Snowflake::new(model.guild_id),
            user_id: Snowflake::new(model.user_id),
            moderator_id: Snowflake::new(model.moderator_id),
            reason: model.reason,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}
