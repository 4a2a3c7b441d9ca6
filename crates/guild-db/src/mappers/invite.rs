//! Invite entity <-> model mapper

use guild_core::entities::Invite;
use guild_core::value_objects::Snowflake;

use crate::models::InviteModel;

impl From<InviteModel> for Invite {
    fn from(model: InviteModel) -> Self {
        Invite {
            code: model.code,
            guild_id: Snowflake::new(model.guild_id),
            channel_id: Snowflake::new(model.channel_id),
            inviter_id: Snowflake::new(model.inviter_id),
            uses: counter_from_db(model.uses),
            max_uses: counter_from_db(model.max_uses),
            temporary: model.temporary,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }
    }
}

/// Counters are BIGINT with a `>= 0` check; saturate anything out of range
pub fn counter_from_db(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_from_db_saturates() {
        assert_eq!(counter_from_db(-3), 0);
        assert_eq!(counter_from_db(7), 7);
        assert_eq!(counter_from_db(i64::MAX), u32::MAX);
    }
}
