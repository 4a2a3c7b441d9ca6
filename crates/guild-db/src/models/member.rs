//! Member database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for guild_members table
///
/// Role ids live in `member_roles` and are loaded separately.
#[derive(Debug, Clone, FromRow)]
pub struct GuildMemberModel {
    pub guild_id: i64,
    pub user_id: i64,
    pub nickname: Option<String>,
    pub temporary: bool,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
