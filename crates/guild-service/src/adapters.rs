//! Default collaborator adapters
//!
//! Quota limits from static configuration, a provisioner that creates
//! nothing, and sinks that log or record events instead of delivering them.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use guild_common::QuotaConfig;
use guild_core::{
    ChannelProvisioner, DomainEvent, Guild, NotificationSink, QuotaLimits, QuotaOracle,
    RepoResult, Snowflake,
};

/// Same limits for every identity, read from configuration
#[derive(Debug, Clone, Copy)]
pub struct StaticQuotaOracle {
    limits: QuotaLimits,
}

impl StaticQuotaOracle {
    pub fn new(limits: QuotaLimits) -> Self {
        Self { limits }
    }

    pub fn unlimited() -> Self {
        Self::new(QuotaLimits::UNLIMITED)
    }
}

impl From<&QuotaConfig> for StaticQuotaOracle {
    fn from(config: &QuotaConfig) -> Self {
        Self::new(QuotaLimits {
            max_guilds_owned: config.max_guilds_owned,
            max_guilds_joined: config.max_guilds_joined,
            max_roles_per_guild: config.max_roles_per_guild,
            max_invites_per_guild: config.max_invites_per_guild,
        })
    }
}

#[async_trait]
impl QuotaOracle for StaticQuotaOracle {
    async fn effective_limits(
        &self,
        _user_id: Snowflake,
        _guild_id: Option<Snowflake>,
    ) -> RepoResult<QuotaLimits> {
        Ok(self.limits)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopChannelProvisioner;

#[async_trait]
impl ChannelProvisioner for NoopChannelProvisioner {
    async fn create_default_channels(&self, _guild: &Guild) -> RepoResult<()> {
        Ok(())
    }
}

/// Writes every event to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn publish(&self, event: DomainEvent) -> RepoResult<()> {
        info!(
            event_type = event.event_type(),
            guild_id = %event.guild_id(),
            "Domain event"
        );
        Ok(())
    }
}

/// Keeps published events in memory for assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(DomainEvent::event_type).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn publish(&self, event: DomainEvent) -> RepoResult<()> {
        self.events.lock().push(event);
        Ok(())
    }
}
