//! Collaborator ports - narrow interfaces to subsystems outside the core

use async_trait::async_trait;

use crate::entities::Guild;
use crate::events::DomainEvent;
use crate::traits::RepoResult;
use crate::value_objects::Snowflake;

/// Effective per-identity limits; `0` means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaLimits {
    pub max_guilds_owned: u32,
    pub max_guilds_joined: u32,
    pub max_roles_per_guild: u32,
    pub max_invites_per_guild: u32,
}

impl QuotaLimits {
    pub const UNLIMITED: Self = Self {
        max_guilds_owned: 0,
        max_guilds_joined: 0,
        max_roles_per_guild: 0,
        max_invites_per_guild: 0,
    };

    /// Whether one more item fits under `limit` given `current` usage
    #[inline]
    pub fn allows(limit: u32, current: u32) -> bool {
        limit == 0 || current < limit
    }
}

/// Answers "how many X may this identity have"
#[async_trait]
pub trait QuotaOracle: Send + Sync {
    async fn effective_limits(
        &self,
        user_id: Snowflake,
        guild_id: Option<Snowflake>,
    ) -> RepoResult<QuotaLimits>;
}

/// Creates the initial channels of a freshly created guild
#[async_trait]
pub trait ChannelProvisioner: Send + Sync {
    async fn create_default_channels(&self, guild: &Guild) -> RepoResult<()>;
}

/// Outbound fan-out of committed changes
///
/// Callers treat publishing as fire-and-forget; a failure never undoes the
/// change that produced the event.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> RepoResult<()>;
}
