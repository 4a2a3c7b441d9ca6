//! Invite database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for invites table
#[derive(Debug, Clone, FromRow)]
pub struct InviteModel {
    pub code: String,
    pub guild_id: i64,
    pub channel_id: i64,
    pub inviter_id: i64,
    pub uses: i64,
    /// 0 is unlimited
    pub max_uses: i64,
    pub temporary: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
