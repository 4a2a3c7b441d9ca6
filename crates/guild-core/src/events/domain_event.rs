//! Domain events - emitted after a membership, role, invite or guild change
//! has been committed. Delivery is best effort through a `NotificationSink`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// All events published by the membership core
///
/// The serialized `type` tag is the public event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    // =========================================================================
    // Community Events
    // =========================================================================
    #[serde(rename = "community.created")]
    CommunityCreated(OwnershipEvent),
    #[serde(rename = "community.updated")]
    CommunityUpdated(GuildEvent),
    #[serde(rename = "community.deleted")]
    CommunityDeleted(GuildEvent),
    #[serde(rename = "community.owner_transferred")]
    OwnerTransferred(OwnershipEvent),

    // =========================================================================
    // Member Events
    // =========================================================================
    #[serde(rename = "server.member_joined")]
    MemberJoined(MemberEvent),
    #[serde(rename = "server.member_left")]
    MemberLeft(MemberEvent),
    #[serde(rename = "server.member_updated")]
    MemberUpdated(MemberEvent),
    #[serde(rename = "server.member_kicked")]
    MemberKicked(ModerationEvent),
    #[serde(rename = "server.member_banned")]
    MemberBanned(ModerationEvent),
    #[serde(rename = "server.member_unbanned")]
    MemberUnbanned(ModerationEvent),

    // =========================================================================
    // Role Events
    // =========================================================================
    #[serde(rename = "role.created")]
    RoleCreated(RoleEvent),
    #[serde(rename = "role.updated")]
    RoleUpdated(RoleEvent),
    #[serde(rename = "role.deleted")]
    RoleDeleted(RoleEvent),
    #[serde(rename = "role.reordered")]
    RolesReordered(GuildEvent),

    // =========================================================================
    // Invite Events
    // =========================================================================
    #[serde(rename = "invite.created")]
    InviteCreated(InviteEvent),
    #[serde(rename = "invite.deleted")]
    InviteDeleted(InviteEvent),
}

impl DomainEvent {
    /// Public event name, identical to the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CommunityCreated(_) => "community.created",
            Self::CommunityUpdated(_) => "community.updated",
            Self::CommunityDeleted(_) => "community.deleted",
            Self::OwnerTransferred(_) => "community.owner_transferred",
            Self::MemberJoined(_) => "server.member_joined",
            Self::MemberLeft(_) => "server.member_left",
            Self::MemberUpdated(_) => "server.member_updated",
            Self::MemberKicked(_) => "server.member_kicked",
            Self::MemberBanned(_) => "server.member_banned",
            Self::MemberUnbanned(_) => "server.member_unbanned",
            Self::RoleCreated(_) => "role.created",
            Self::RoleUpdated(_) => "role.updated",
            Self::RoleDeleted(_) => "role.deleted",
            Self::RolesReordered(_) => "role.reordered",
            Self::InviteCreated(_) => "invite.created",
            Self::InviteDeleted(_) => "invite.deleted",
        }
    }

    /// Guild the event belongs to (used for channel routing)
    pub fn guild_id(&self) -> Snowflake {
        match self {
            Self::CommunityCreated(e) | Self::OwnerTransferred(e) => e.guild_id,
            Self::CommunityUpdated(e) | Self::CommunityDeleted(e) | Self::RolesReordered(e) => {
                e.guild_id
            }
            Self::MemberJoined(e) | Self::MemberLeft(e) | Self::MemberUpdated(e) => e.guild_id,
            Self::MemberKicked(e) | Self::MemberBanned(e) | Self::MemberUnbanned(e) => e.guild_id,
            Self::RoleCreated(e) | Self::RoleUpdated(e) | Self::RoleDeleted(e) => e.guild_id,
            Self::InviteCreated(e) | Self::InviteDeleted(e) => e.guild_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::CommunityCreated(e) | Self::OwnerTransferred(e) => e.timestamp,
            Self::CommunityUpdated(e) | Self::CommunityDeleted(e) | Self::RolesReordered(e) => {
                e.timestamp
            }
            Self::MemberJoined(e) | Self::MemberLeft(e) | Self::MemberUpdated(e) => e.timestamp,
            Self::MemberKicked(e) | Self::MemberBanned(e) | Self::MemberUnbanned(e) => e.timestamp,
            Self::RoleCreated(e) | Self::RoleUpdated(e) | Self::RoleDeleted(e) => e.timestamp,
            Self::InviteCreated(e) | Self::InviteDeleted(e) => e.timestamp,
        }
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildEvent {
    pub guild_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

/// Creation (previous owner absent) or ownership transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipEvent {
    pub guild_id: Snowflake,
    pub owner_id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_owner_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEvent {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationEvent {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub moderator_id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleEvent {
    pub guild_id: Snowflake,
    pub role_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteEvent {
    pub guild_id: Snowflake,
    pub code: String,
    pub inviter_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Creation Helpers
// ============================================================================

impl GuildEvent {
    pub fn new(guild_id: Snowflake) -> Self {
        Self {
            guild_id,
            timestamp: Utc::now(),
        }
    }
}

impl OwnershipEvent {
    pub fn created(guild_id: Snowflake, owner_id: Snowflake) -> Self {
        Self {
            guild_id,
            owner_id,
            previous_owner_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn transferred(guild_id: Snowflake, from: Snowflake, to: Snowflake) -> Self {
        Self {
            previous_owner_id: Some(from),
            ..Self::created(guild_id, to)
        }
    }
}

impl MemberEvent {
    pub fn new(guild_id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            guild_id,
            user_id,
            invite_code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn via_invite(guild_id: Snowflake, user_id: Snowflake, code: &str) -> Self {
        Self {
            invite_code: Some(code.to_string()),
            ..Self::new(guild_id, user_id)
        }
    }
}

impl ModerationEvent {
    pub fn new(guild_id: Snowflake, user_id: Snowflake, moderator_id: Snowflake) -> Self {
        Self {
            guild_id,
            user_id,
            moderator_id,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }
}

impl RoleEvent {
    pub fn new(guild_id: Snowflake, role_id: Snowflake) -> Self {
        Self {
            guild_id,
            role_id,
            timestamp: Utc::now(),
        }
    }
}

impl InviteEvent {
    pub fn new(guild_id: Snowflake, code: &str, inviter_id: Snowflake) -> Self {
        Self {
            guild_id,
            code: code.to_string(),
            inviter_id,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_is_event_name() {
        let event = DomainEvent::MemberJoined(MemberEvent::via_invite(
            Snowflake::new(1),
            Snowflake::new(2),
            "abcd1234",
        ));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "server.member_joined");
        assert_eq!(json["guild_id"], "1");
        assert_eq!(json["invite_code"], "abcd1234");

        let parsed: DomainEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_event_type_matches_serialized_tag() {
        let events = [
            DomainEvent::CommunityCreated(OwnershipEvent::created(Snowflake::new(1), Snowflake::new(2))),
            DomainEvent::OwnerTransferred(OwnershipEvent::transferred(
                Snowflake::new(1),
                Snowflake::new(2),
                Snowflake::new(3),
            )),
            DomainEvent::RolesReordered(GuildEvent::new(Snowflake::new(1))),
            DomainEvent::MemberBanned(
                ModerationEvent::new(Snowflake::new(1), Snowflake::new(2), Snowflake::new(3))
                    .with_reason(Some("spam".to_string())),
            ),
            DomainEvent::InviteDeleted(InviteEvent::new(Snowflake::new(1), "code", Snowflake::new(2))),
        ];

        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
            assert_eq!(event.guild_id(), Snowflake::new(1));
        }
    }
}
