//! Ban entity - a moderation record keyed by `(guild_id, user_id)`

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Ban entity
///
/// A ban whose `expires_at` has passed is inactive but may still be stored
/// until it is overwritten or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ban {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub moderator_id: Snowflake,
    pub reason: Option<String>,
    /// None is permanent
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Ban {
    pub fn new(guild_id: Snowflake, user_id: Snowflake, moderator_id: Snowflake) -> Self {
        Self {
            guild_id,
            user_id,
            moderator_id,
            reason: None,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| now <= expires_at)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }
}
