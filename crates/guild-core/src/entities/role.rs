//! Role entity - a named permission bitmask scoped to one guild

use chrono::{DateTime, Utc};

use crate::value_objects::{Permissions, Snowflake};

/// Name given to the default role of every guild
pub const DEFAULT_ROLE_NAME: &str = "@everyone";

/// Largest accepted role color (24-bit RGB)
pub const MAX_ROLE_COLOR: i32 = 0xFF_FF_FF;

/// Role entity
///
/// `position` is both the render order and the hierarchy key. Positions are
/// not required to be contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub color: i32,
    pub hoist: bool,
    pub position: i32,
    pub permissions: Permissions,
    pub mentionable: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(id: Snowflake, guild_id: Snowflake, name: String, permissions: Permissions) -> Self {
        let now = Utc::now();
        Self {
            id,
            guild_id,
            name,
            color: 0,
            hoist: false,
            position: 0,
            permissions,
            mentionable: false,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the default role of a guild, carrying `baseline` permissions at position 0
    pub fn default_for(id: Snowflake, guild_id: Snowflake, baseline: Permissions) -> Self {
        Self {
            is_default: true,
            ..Self::new(id, guild_id, DEFAULT_ROLE_NAME.to_string(), baseline)
        }
    }

    #[inline]
    pub fn has_permission(&self, permission: Permissions) -> bool {
        self.permissions.has(permission)
    }

    #[inline]
    pub fn is_higher_than(&self, other: &Role) -> bool {
        self.position > other.position
    }

    pub fn color_hex(&self) -> String {
        format!("{:06x}", self.color)
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now();
    }

    pub fn set_color(&mut self, color: i32) {
        self.color = color;
        self.updated_at = Utc::now();
    }

    pub fn set_permissions(&mut self, permissions: Permissions) {
        self.permissions = permissions;
        self.updated_at = Utc::now();
    }

    pub fn set_position(&mut self, position: i32) {
        self.position = position;
        self.updated_at = Utc::now();
    }

    pub fn set_hoist(&mut self, hoist: bool) {
        self.hoist = hoist;
        self.updated_at = Utc::now();
    }

    pub fn set_mentionable(&mut self, mentionable: bool) {
        self.mentionable = mentionable;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_creation() {
        let role = Role::new(
            Snowflake::new(1),
            Snowflake::new(100),
            "Moderator".to_string(),
            Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS,
        );
        assert_eq!(role.name, "Moderator");
        assert!(role.has_permission(Permissions::KICK_MEMBERS));
        assert!(!role.has_permission(Permissions::MANAGE_GUILD));
        assert!(!role.is_default);
    }

    #[test]
    fn test_default_role() {
        let role = Role::default_for(Snowflake::new(1), Snowflake::new(100), Permissions::DEFAULT);
        assert_eq!(role.name, DEFAULT_ROLE_NAME);
        assert!(role.is_default);
        assert_eq!(role.position, 0);
        assert!(role.has_permission(Permissions::CREATE_INVITE));
    }

    #[test]
    fn test_hierarchy_and_color() {
        let mut high = Role::new(Snowflake::new(1), Snowflake::new(100), "High".into(), Permissions::empty());
        let low = Role::new(Snowflake::new(2), Snowflake::new(100), "Low".into(), Permissions::empty());
        high.set_position(10);
        high.set_color(0xFF0000);

        assert!(high.is_higher_than(&low));
        assert!(!low.is_higher_than(&high));
        assert_eq!(high.color_hex(), "ff0000");
        assert_eq!(low.color_hex(), "000000");
    }
}
