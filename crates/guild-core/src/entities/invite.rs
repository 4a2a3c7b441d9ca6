//! Invite entity - a redeemable code granting membership in a guild

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::value_objects::Snowflake;

/// Length of generated invite codes
pub const INVITE_CODE_LEN: usize = 8;

const INVITE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Invite entity
///
/// `max_uses == 0` means unlimited. `uses` only grows, and only on a
/// successful redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub code: String,
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub inviter_id: Snowflake,
    pub uses: u32,
    pub max_uses: u32,
    pub temporary: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Invite {
    pub fn new(code: String, guild_id: Snowflake, channel_id: Snowflake, inviter_id: Snowflake) -> Self {
        Self {
            code,
            guild_id,
            channel_id,
            inviter_id,
            uses: 0,
            max_uses: 0,
            temporary: false,
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Expire `max_age_secs` after creation; 0 never expires
    pub fn with_max_age(mut self, max_age_secs: u32) -> Self {
        self.expires_at = (max_age_secs > 0)
            .then(|| self.created_at + Duration::seconds(i64::from(max_age_secs)));
        self
    }

    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = max_uses;
        self
    }

    pub fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    /// Expired strictly after `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_uses == 0
    }

    pub fn is_exhausted(&self) -> bool {
        !self.is_unlimited() && self.uses >= self.max_uses
    }

    /// None when unlimited
    pub fn remaining_uses(&self) -> Option<u32> {
        (!self.is_unlimited()).then(|| self.max_uses.saturating_sub(self.uses))
    }
}

/// Generate a random alphanumeric invite code
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CHARSET[rng.gen_range(0..INVITE_CHARSET.len())] as char)
        .collect()
}
