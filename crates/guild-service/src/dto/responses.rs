//! Response DTOs
//!
//! All response DTOs implement `Serialize` for JSON output. Snowflake IDs
//! and permission bits serialize as strings.

use chrono::{DateTime, Utc};
use serde::Serialize;

use guild_core::{Permissions, Snowflake};

/// Cursor-paginated list
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Cursor for the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Snowflake>,
    pub has_more: bool,
    pub limit: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, after: Option<Snowflake>, has_more: bool, limit: u32) -> Self {
        Self {
            data,
            pagination: PaginationMeta {
                after,
                has_more,
                limit,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuildResponse {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleResponse {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub color: i32,
    pub hoist: bool,
    pub position: i32,
    pub permissions: Permissions,
    pub mentionable: bool,
    #[serde(rename = "default")]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberResponse {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub roles: Vec<Snowflake>,
    pub temporary: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BanResponse {
    pub user_id: Snowflake,
    pub moderator_id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InviteResponse {
    pub code: String,
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub inviter_id: Snowflake,
    pub uses: u32,
    /// 0 = unlimited
    pub max_uses: u32,
    pub temporary: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}
