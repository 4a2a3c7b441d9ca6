//! Permission bitflags and the effective-permission engine
//!
//! Permissions are stored as a 64-bit integer bitfield. Effective permissions
//! for a requester are derived from the guild owner, the requester and the
//! bitmasks of every role assigned to the requester.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::Snowflake;

bitflags! {
    /// Guild permission flags
    ///
    /// Stored as BIGINT in database, serialized as string in JSON for JavaScript safety.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        /// View channel and read messages
        const VIEW_CHANNEL     = 1 << 0;
        /// Send messages in text channels
        const SEND_MESSAGES    = 1 << 1;
        /// Delete other users' messages
        const MANAGE_MESSAGES  = 1 << 2;
        /// Create, edit, delete channels
        const MANAGE_CHANNELS  = 1 << 3;
        /// Create, edit, delete, assign roles
        const MANAGE_ROLES     = 1 << 4;
        /// Edit guild settings and manage invites
        const MANAGE_GUILD     = 1 << 5;
        /// Kick members from guild
        const KICK_MEMBERS     = 1 << 6;
        /// Ban members from guild
        const BAN_MEMBERS      = 1 << 7;
        /// Implies every other permission
        const ADMINISTRATOR    = 1 << 8;
        /// Upload files and images
        const ATTACH_FILES     = 1 << 9;
        /// Add emoji reactions
        const ADD_REACTIONS    = 1 << 10;
        /// Create invite codes
        const CREATE_INVITE    = 1 << 11;
        /// Change other members' nicknames
        const MANAGE_NICKNAMES = 1 << 12;

        /// Baseline permissions for the default role
        const DEFAULT = Self::VIEW_CHANNEL.bits()
            | Self::SEND_MESSAGES.bits()
            | Self::ADD_REACTIONS.bits()
            | Self::ATTACH_FILES.bits()
            | Self::CREATE_INVITE.bits();

        /// All-permissions sentinel (owners and administrators)
        const ALL = u64::MAX;
    }
}

const NAMED: [(Permissions, &str); 13] = [
    (Permissions::VIEW_CHANNEL, "VIEW_CHANNEL"),
    (Permissions::SEND_MESSAGES, "SEND_MESSAGES"),
    (Permissions::MANAGE_MESSAGES, "MANAGE_MESSAGES"),
    (Permissions::MANAGE_CHANNELS, "MANAGE_CHANNELS"),
    (Permissions::MANAGE_ROLES, "MANAGE_ROLES"),
    (Permissions::MANAGE_GUILD, "MANAGE_GUILD"),
    (Permissions::KICK_MEMBERS, "KICK_MEMBERS"),
    (Permissions::BAN_MEMBERS, "BAN_MEMBERS"),
    (Permissions::ADMINISTRATOR, "ADMINISTRATOR"),
    (Permissions::ATTACH_FILES, "ATTACH_FILES"),
    (Permissions::ADD_REACTIONS, "ADD_REACTIONS"),
    (Permissions::CREATE_INVITE, "CREATE_INVITE"),
    (Permissions::MANAGE_NICKNAMES, "MANAGE_NICKNAMES"),
];

impl Permissions {
    /// Compute the effective permissions of `requester_id` in a guild owned by `owner_id`
    ///
    /// The owner always receives [`Permissions::ALL`] regardless of roles. For
    /// everyone else the role masks are OR'd together, and a result carrying
    /// [`Permissions::ADMINISTRATOR`] is widened to [`Permissions::ALL`].
    /// A requester without roles gets the empty set.
    pub fn effective<I>(owner_id: Snowflake, requester_id: Snowflake, role_masks: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        if requester_id == owner_id {
            return Permissions::ALL;
        }

        let combined = Self::combine(role_masks);
        if combined.contains(Permissions::ADMINISTRATOR) {
            Permissions::ALL
        } else {
            combined
        }
    }

    /// Check if the permission set contains a required permission
    ///
    /// Administrators bypass all permission checks.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.contains(permission)
    }

    /// Combine permissions from multiple roles
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        roles.into_iter().fold(Permissions::empty(), |acc, p| acc | p)
    }

    /// Get the raw bits as i64 (for database storage)
    #[inline]
    pub fn to_i64(self) -> i64 {
        self.bits() as i64
    }

    /// Create from raw i64 bits (from database)
    #[inline]
    pub fn from_i64(bits: i64) -> Self {
        Permissions::from_bits_truncate(bits as u64)
    }

    /// Parse from string representation (decimal number)
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.parse::<u64>().map(Permissions::from_bits_truncate)
    }

    /// Names of the individual permissions that are set
    pub fn list(&self) -> Vec<&'static str> {
        NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

// Serialize as string for JSON (JavaScript BigInt safety)
impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing permission bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value as u64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(Permissions::from_bits_truncate)
                    .map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

impl From<i64> for Permissions {
    fn from(bits: i64) -> Self {
        Permissions::from_bits_truncate(bits as u64)
    }
}

impl From<Permissions> for i64 {
    fn from(perms: Permissions) -> Self {
        perms.bits() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Snowflake = Snowflake::new(1);
    const MEMBER: Snowflake = Snowflake::new(2);

    #[test]
    fn test_owner_gets_everything_regardless_of_roles() {
        assert_eq!(Permissions::effective(OWNER, OWNER, []), Permissions::ALL);
        assert_eq!(
            Permissions::effective(OWNER, OWNER, [Permissions::empty()]),
            Permissions::ALL
        );
        assert_eq!(
            Permissions::effective(OWNER, OWNER, [Permissions::VIEW_CHANNEL]),
            Permissions::ALL
        );
    }

    #[test]
    fn test_roles_are_ored_together() {
        let effective = Permissions::effective(
            OWNER,
            MEMBER,
            [Permissions::SEND_MESSAGES, Permissions::MANAGE_MESSAGES],
        );
        assert_eq!(
            effective,
            Permissions::SEND_MESSAGES | Permissions::MANAGE_MESSAGES
        );
    }

    #[test]
    fn test_administrator_absorbs_all_bits() {
        let effective = Permissions::effective(
            OWNER,
            MEMBER,
            [Permissions::VIEW_CHANNEL, Permissions::ADMINISTRATOR],
        );
        assert_eq!(effective, Permissions::ALL);
        assert!(effective.contains(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_no_roles_yields_empty_set() {
        assert_eq!(
            Permissions::effective(OWNER, MEMBER, []),
            Permissions::empty()
        );
    }

    #[test]
    fn test_default_permissions() {
        let default = Permissions::DEFAULT;
        assert!(default.contains(Permissions::VIEW_CHANNEL));
        assert!(default.contains(Permissions::SEND_MESSAGES));
        assert!(default.contains(Permissions::CREATE_INVITE));
        assert!(!default.contains(Permissions::ADMINISTRATOR));
        assert!(!default.contains(Permissions::MANAGE_GUILD));
    }

    #[test]
    fn test_has_permission() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert!(perms.has(Permissions::VIEW_CHANNEL));
        assert!(!perms.has(Permissions::MANAGE_GUILD));
        assert!(Permissions::ADMINISTRATOR.has(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_serialize_json() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        let json = serde_json::to_string(&perms).unwrap();
        assert_eq!(json, "\"3\"");
    }

    #[test]
    fn test_deserialize_string_or_number() {
        let from_str: Permissions = serde_json::from_str("\"3\"").unwrap();
        let from_num: Permissions = serde_json::from_str("3").unwrap();
        assert_eq!(from_str, from_num);
        assert!(from_num.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn test_list_permissions() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::ADMINISTRATOR;
        assert_eq!(perms.list(), vec!["VIEW_CHANNEL", "ADMINISTRATOR"]);
    }

    #[test]
    fn test_to_from_i64_keeps_high_bit() {
        let bits = Permissions::ALL.to_i64();
        assert_eq!(bits, -1);
        assert_eq!(Permissions::from_i64(bits), Permissions::ALL);
    }
}
