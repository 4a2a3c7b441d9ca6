//! Pub/Sub channel naming.

use guild_core::{DomainEvent, Snowflake};

/// Channel prefix for guild events
pub const GUILD_CHANNEL_PREFIX: &str = "guild:";
/// Channel prefix for events addressed to one user
pub const USER_CHANNEL_PREFIX: &str = "user:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Every subscriber interested in one guild
    Guild(Snowflake),
    /// The user an event is about, across all their sessions
    User(Snowflake),
}

impl PubSubChannel {
    #[must_use]
    pub fn guild(guild_id: Snowflake) -> Self {
        Self::Guild(guild_id)
    }

    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    /// Channels an event is delivered on
    ///
    /// Always the guild channel. Events that change one user's standing in
    /// the guild also go to that user, since after a kick or ban they no
    /// longer receive guild traffic.
    #[must_use]
    pub fn for_event(event: &DomainEvent) -> Vec<Self> {
        let guild = Self::guild(event.guild_id());
        let subject = match event {
            DomainEvent::MemberKicked(e)
            | DomainEvent::MemberBanned(e)
            | DomainEvent::MemberUnbanned(e) => Some(e.user_id),
            DomainEvent::OwnerTransferred(e) => Some(e.owner_id),
            _ => None,
        };

        match subject {
            Some(user_id) => vec![guild, Self::user(user_id)],
            None => vec![guild],
        }
    }

    /// Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Guild(id) => format!("{GUILD_CHANNEL_PREFIX}{id}"),
            Self::User(id) => format!("{USER_CHANNEL_PREFIX}{id}"),
        }
    }

    /// Parse a Redis channel name; None for names this crate does not publish on
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(id) = name.strip_prefix(GUILD_CHANNEL_PREFIX) {
            return id.parse::<i64>().ok().map(|id| Self::Guild(Snowflake::from(id)));
        }
        if let Some(id) = name.strip_prefix(USER_CHANNEL_PREFIX) {
            return id.parse::<i64>().ok().map(|id| Self::User(Snowflake::from(id)));
        }
        None
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
