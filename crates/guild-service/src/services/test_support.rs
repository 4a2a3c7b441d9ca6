//! Shared fixtures for service tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use guild_core::{
    ChannelProvisioner, Guild, GuildMember, QuotaLimits, QuotaOracle, RepoResult, Snowflake,
};
use guild_db::InMemoryRepositories;
use tokio::sync::Notify;

use crate::adapters::RecordingSink;
use crate::dto::CreateGuildRequest;

use super::context::{ServiceContext, ServiceContextBuilder};
use super::guild::GuildService;

pub(crate) const OWNER: Snowflake = Snowflake::new(1001);
pub(crate) const USER: Snowflake = Snowflake::new(1002);
pub(crate) const OTHER: Snowflake = Snowflake::new(1003);

pub(crate) struct Harness {
    pub ctx: ServiceContext,
    pub repos: InMemoryRepositories,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(|builder| builder)
    }

    pub fn with(configure: impl FnOnce(ServiceContextBuilder) -> ServiceContextBuilder) -> Self {
        let repos = InMemoryRepositories::new();
        let sink = Arc::new(RecordingSink::new());
        let builder = ServiceContext::builder()
            .in_memory(&repos)
            .notifier(sink.clone());
        let ctx = configure(builder).build().unwrap();
        Self { ctx, repos, sink }
    }

    /// Create a guild owned by `owner` through the service
    pub async fn guild(&self, owner: Snowflake) -> Guild {
        let created = GuildService::new(&self.ctx)
            .create_guild(owner, CreateGuildRequest::named("Test Guild"))
            .await
            .unwrap();
        self.ctx.require_guild(created.id).await.unwrap()
    }

    /// Insert a plain membership, bypassing invites
    pub async fn join(&self, guild_id: Snowflake, user: Snowflake) {
        let default = self
            .ctx
            .role_repo()
            .find_default(guild_id)
            .await
            .unwrap()
            .unwrap();
        self.ctx
            .member_repo()
            .create(&GuildMember::new(guild_id, user, default.id))
            .await
            .unwrap();
    }
}

/// Holds the first call made after [`Gate::arm`] until [`Gate::release`]
#[derive(Default)]
pub(crate) struct Gate {
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl Gate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Wait until an armed call is being held
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
    }
}

/// Unlimited quotas, answered through a [`Gate`]
pub(crate) struct GatedQuotaOracle(pub Arc<Gate>);

#[async_trait]
impl QuotaOracle for GatedQuotaOracle {
    async fn effective_limits(
        &self,
        _user_id: Snowflake,
        _guild_id: Option<Snowflake>,
    ) -> RepoResult<QuotaLimits> {
        self.0.pass().await;
        Ok(QuotaLimits::UNLIMITED)
    }
}

/// Provisions nothing, answered through a [`Gate`]
pub(crate) struct GatedProvisioner(pub Arc<Gate>);

#[async_trait]
impl ChannelProvisioner for GatedProvisioner {
    async fn create_default_channels(&self, _guild: &Guild) -> RepoResult<()> {
        self.0.pass().await;
        Ok(())
    }
}
