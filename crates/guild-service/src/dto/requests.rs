//! Request DTOs
//!
//! All request DTOs implement `Deserialize` and `Validate`; services call
//! `validate()` before touching any repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use guild_core::{Permissions, Snowflake};

// ============================================================================
// Guild Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGuildRequest {
    #[validate(length(min = 1, max = 100, message = "Guild name must be 1-100 characters"))]
    pub name: String,

    /// Icon hash
    pub icon: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

impl CreateGuildRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            description: None,
        }
    }
}

/// Patch of guild fields; an empty string clears an optional field
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateGuildRequest {
    #[validate(length(min = 1, max = 100, message = "Guild name must be 1-100 characters"))]
    pub name: Option<String>,

    pub icon: Option<String>,

    pub banner: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

impl UpdateGuildRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.icon.is_none()
            && self.banner.is_none()
            && self.description.is_none()
    }
}

// ============================================================================
// Role Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "Role name must be 1-100 characters"))]
    pub name: String,

    /// RGB color as integer
    #[serde(default)]
    #[validate(range(min = 0, max = 16_777_215, message = "Color must be a 24-bit RGB value"))]
    pub color: i32,

    #[serde(default)]
    pub hoist: bool,

    /// Permission bits, empty when absent
    #[serde(default)]
    pub permissions: Option<Permissions>,

    #[serde(default)]
    pub mentionable: bool,
}

impl CreateRoleRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: 0,
            hoist: false,
            permissions: None,
            mentionable: false,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

/// Role patch; only `Some` fields change
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "Role name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0, max = 16_777_215, message = "Color must be a 24-bit RGB value"))]
    pub color: Option<i32>,

    pub hoist: Option<bool>,

    pub permissions: Option<Permissions>,

    pub mentionable: Option<bool>,
}

impl UpdateRoleRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.hoist.is_none()
            && self.permissions.is_none()
            && self.mentionable.is_none()
    }
}

/// Full replacement of the position of some roles
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRolePositionsRequest {
    #[validate(length(min = 1, message = "At least one role position is required"))]
    pub positions: Vec<RolePosition>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RolePosition {
    pub id: Snowflake,
    pub position: i32,
}

// ============================================================================
// Member Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateNicknameRequest {
    /// Nickname, `None` to remove
    #[validate(length(min = 1, max = 32, message = "Nickname must be 1-32 characters"))]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ListMembersRequest {
    #[serde(default = "default_member_page")]
    #[validate(range(min = 1, max = 1000, message = "Limit must be 1-1000"))]
    pub limit: u32,

    /// Return members with a user id greater than this one
    pub after: Option<Snowflake>,
}

impl Default for ListMembersRequest {
    fn default() -> Self {
        Self {
            limit: default_member_page(),
            after: None,
        }
    }
}

fn default_member_page() -> u32 {
    100
}

// ============================================================================
// Ban Requests
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateBanRequest {
    #[validate(length(max = 512, message = "Reason must be at most 512 characters"))]
    pub reason: Option<String>,

    /// Absent for a permanent ban
    pub expires_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Invite Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInviteRequest {
    /// Target channel; the guild's id (its default channel) when absent
    pub channel_id: Option<Snowflake>,

    /// Seconds until expiry (0 = never expires, default = 86400)
    #[serde(default = "default_invite_max_age")]
    #[validate(range(max = 604_800, message = "Max age must be at most 7 days"))]
    pub max_age_secs: u32,

    /// Max number of uses (0 = unlimited)
    #[serde(default)]
    #[validate(range(max = 100, message = "Max uses must be at most 100"))]
    pub max_uses: u32,

    /// Members joining through this invite are temporary
    #[serde(default)]
    pub temporary: bool,
}

impl Default for CreateInviteRequest {
    fn default() -> Self {
        Self {
            channel_id: None,
            max_age_secs: default_invite_max_age(),
            max_uses: 0,
            temporary: false,
        }
    }
}

impl CreateInviteRequest {
    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = max_uses;
        self
    }

    pub fn never_expires(mut self) -> Self {
        self.max_age_secs = 0;
        self
    }
}

fn default_invite_max_age() -> u32 {
    86400
}

#[cfg(test)]
mod tests {
    use guild_core::MAX_ROLE_COLOR;

    use super::*;

    #[test]
    fn test_create_guild_validation() {
        let valid = CreateGuildRequest {
            name: "My Guild".to_string(),
            icon: None,
            description: Some("A cool guild".to_string()),
        };
        assert!(valid.validate().is_ok());
        assert!(CreateGuildRequest::named("").validate().is_err());
        assert!(CreateGuildRequest::named("a".repeat(101)).validate().is_err());
    }

    #[test]
    fn test_role_color_bounds() {
        let mut request = CreateRoleRequest::named("Mods");
        request.color = MAX_ROLE_COLOR;
        assert!(request.validate().is_ok());

        request.color = MAX_ROLE_COLOR + 1;
        assert!(request.validate().is_err());

        let patch = UpdateRoleRequest {
            color: Some(-1),
            ..UpdateRoleRequest::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_role_permissions_deserialize_from_string() {
        let request: CreateRoleRequest =
            serde_json::from_str(r#"{"name":"Mods","permissions":"64"}"#).unwrap();
        assert_eq!(request.permissions, Some(Permissions::KICK_MEMBERS));
        assert_eq!(request.color, 0);
    }

    #[test]
    fn test_invite_defaults() {
        let request: CreateInviteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.max_age_secs, 86400);
        assert_eq!(request.max_uses, 0);
        assert!(!request.temporary);
        assert!(request.validate().is_ok());

        let too_many = CreateInviteRequest::default().with_max_uses(101);
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_empty_patches() {
        assert!(UpdateRoleRequest::default().is_empty());
        assert!(UpdateGuildRequest::default().is_empty());
        let patch = UpdateRoleRequest {
            hoist: Some(true),
            ..UpdateRoleRequest::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_role_positions_require_an_entry() {
        let empty = UpdateRolePositionsRequest { positions: Vec::new() };
        assert!(empty.validate().is_err());

        let request: UpdateRolePositionsRequest =
            serde_json::from_str(r#"{"positions":[{"id":"42","position":1}]}"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.positions[0].id, Snowflake::new(42));
    }
}
