//! Member entity - a user's membership record in one guild

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Guild member keyed by `(guild_id, user_id)`
///
/// `role_ids` keeps insertion order and always includes the guild's default role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMember {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
    /// Joined through a temporary invite
    pub temporary: bool,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuildMember {
    /// New member holding only the guild's default role
    pub fn new(guild_id: Snowflake, user_id: Snowflake, default_role_id: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            guild_id,
            user_id,
            nickname: None,
            role_ids: vec![default_role_id],
            temporary: false,
            joined_at: now,
            updated_at: now,
        }
    }

    pub fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Returns false when the role was already held
    pub fn add_role(&mut self, role_id: Snowflake) -> bool {
        if self.has_role(role_id) {
            return false;
        }
        self.role_ids.push(role_id);
        self.updated_at = Utc::now();
        true
    }

    /// Returns false when the role was not held
    pub fn remove_role(&mut self, role_id: Snowflake) -> bool {
        let before = self.role_ids.len();
        self.role_ids.retain(|&id| id != role_id);
        let removed = self.role_ids.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn set_nickname(&mut self, nickname: Option<String>) {
        self.nickname = nickname;
        self.updated_at = Utc::now();
    }
}
