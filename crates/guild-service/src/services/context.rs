//! Service context - dependency container for services
//!
//! Holds the repositories, external collaborators and membership settings
//! every service borrows.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use guild_common::{AccessPolicyKind, AppConfig, InviteAccounting};
use guild_core::traits::{
    AccessPolicy, BanRepository, ChannelProvisioner, GuildRepository, InviteRepository,
    MemberRepository, MembershipOnlyPolicy, NotificationSink, PermissionBitsPolicy, QuotaLimits,
    QuotaOracle, RepoResult, RoleRepository,
};
use guild_core::{DomainError, DomainEvent, Guild, Permissions, Snowflake, SnowflakeGenerator};
use guild_cache::{RedisNotificationSink, RedisPool};
use guild_db::{
    InMemoryRepositories, PgBanRepository, PgGuildRepository, PgInviteRepository,
    PgMemberRepository, PgPool, PgRoleRepository,
};

use crate::adapters::{NoopChannelProvisioner, StaticQuotaOracle, TracingNotificationSink};

use super::error::{ServiceError, ServiceResult};

const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(2);

/// Service context containing all dependencies
///
/// Cheap to clone: every dependency sits behind an `Arc`. Write sequences
/// that must survive caller cancellation move a clone into a spawned task.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    guild_repo: Arc<dyn GuildRepository>,
    role_repo: Arc<dyn RoleRepository>,
    member_repo: Arc<dyn MemberRepository>,
    ban_repo: Arc<dyn BanRepository>,
    invite_repo: Arc<dyn InviteRepository>,

    // Collaborators
    quota_oracle: Arc<dyn QuotaOracle>,
    channel_provisioner: Arc<dyn ChannelProvisioner>,
    notifier: Arc<dyn NotificationSink>,
    access_policy: Arc<dyn AccessPolicy>,

    // Settings
    invite_accounting: InviteAccounting,
    collaborator_timeout: Duration,
    baseline_permissions: Permissions,
    snowflake_generator: Arc<SnowflakeGenerator>,
}

impl ServiceContext {
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    pub fn guild_repo(&self) -> &dyn GuildRepository {
        self.guild_repo.as_ref()
    }

    pub fn role_repo(&self) -> &dyn RoleRepository {
        self.role_repo.as_ref()
    }

    pub fn member_repo(&self) -> &dyn MemberRepository {
        self.member_repo.as_ref()
    }

    pub fn ban_repo(&self) -> &dyn BanRepository {
        self.ban_repo.as_ref()
    }

    pub fn invite_repo(&self) -> &dyn InviteRepository {
        self.invite_repo.as_ref()
    }

    // === Collaborators ===

    pub fn access_policy(&self) -> &dyn AccessPolicy {
        self.access_policy.as_ref()
    }

    pub fn invite_accounting(&self) -> InviteAccounting {
        self.invite_accounting
    }

    /// Permissions given to the default role of new guilds
    pub fn baseline_permissions(&self) -> Permissions {
        self.baseline_permissions
    }

    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }

    /// Load a guild or fail with `GuildNotFound`
    pub async fn require_guild(&self, guild_id: Snowflake) -> ServiceResult<Guild> {
        self.guild_repo
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| DomainError::GuildNotFound(guild_id).into())
    }

    /// Quota limits for `user_id`, bounded by the collaborator timeout
    pub async fn quota_limits(
        &self,
        user_id: Snowflake,
        guild_id: Option<Snowflake>,
    ) -> ServiceResult<QuotaLimits> {
        self.call_collaborator(
            "quota oracle",
            self.quota_oracle.effective_limits(user_id, guild_id),
        )
        .await
    }

    /// Ask the provisioner for the starter channels of `guild`
    pub async fn provision_channels(&self, guild: &Guild) -> ServiceResult<()> {
        self.call_collaborator(
            "channel provisioner",
            self.channel_provisioner.create_default_channels(guild),
        )
        .await
    }

    /// Fire-and-forget publish; failures are logged and dropped
    pub async fn publish(&self, event: DomainEvent) {
        let event_type = event.event_type();
        if let Err(err) = self
            .call_collaborator("notification sink", self.notifier.publish(event))
            .await
        {
            warn!(event_type, error = %err, "Failed to publish event");
        }
    }

    /// Run a write unit on its own task and wait for it
    ///
    /// Dropping the caller's future does not abort the unit.
    pub(crate) async fn detached<T, F>(
        &self,
        unit: impl FnOnce(ServiceContext) -> F,
    ) -> ServiceResult<T>
    where
        F: Future<Output = ServiceResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(unit(self.clone()))
            .await
            .map_err(|e| ServiceError::internal(format!("write unit aborted: {e}")))?
    }

    async fn call_collaborator<T>(
        &self,
        collaborator: &'static str,
        call: impl Future<Output = RepoResult<T>>,
    ) -> ServiceResult<T> {
        match tokio::time::timeout(self.collaborator_timeout, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => Err(ServiceError::Timeout {
                collaborator,
                after: self.collaborator_timeout,
            }),
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("access_policy", &self.access_policy.name())
            .field("invite_accounting", &self.invite_accounting)
            .field("collaborator_timeout", &self.collaborator_timeout)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
///
/// Repositories are required. Collaborators default to the static quota
/// oracle, the no-op provisioner, the logging sink and the permission-bits
/// policy.
pub struct ServiceContextBuilder {
    guild_repo: Option<Arc<dyn GuildRepository>>,
    role_repo: Option<Arc<dyn RoleRepository>>,
    member_repo: Option<Arc<dyn MemberRepository>>,
    ban_repo: Option<Arc<dyn BanRepository>>,
    invite_repo: Option<Arc<dyn InviteRepository>>,
    quota_oracle: Option<Arc<dyn QuotaOracle>>,
    channel_provisioner: Option<Arc<dyn ChannelProvisioner>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    access_policy: Option<Arc<dyn AccessPolicy>>,
    invite_accounting: InviteAccounting,
    collaborator_timeout: Duration,
    baseline_permissions: Permissions,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            guild_repo: None,
            role_repo: None,
            member_repo: None,
            ban_repo: None,
            invite_repo: None,
            quota_oracle: None,
            channel_provisioner: None,
            notifier: None,
            access_policy: None,
            invite_accounting: InviteAccounting::default(),
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
            baseline_permissions: Permissions::DEFAULT,
            snowflake_generator: None,
        }
    }

    /// Apply quota, accounting, policy, timeout and worker id settings
    ///
    /// A configured Redis URL also switches the notifier to Redis Pub/Sub.
    pub fn config(mut self, config: &AppConfig) -> ServiceResult<Self> {
        let generator = SnowflakeGenerator::new(config.snowflake.worker_id)
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        self.quota_oracle = Some(Arc::new(StaticQuotaOracle::from(&config.quota)));
        self.invite_accounting = config.membership.invite_accounting;
        self.collaborator_timeout = config.membership.collaborator_timeout();
        self.access_policy = Some(match config.membership.access_policy {
            AccessPolicyKind::MembershipOnly => Arc::new(MembershipOnlyPolicy),
            AccessPolicyKind::PermissionBits => Arc::new(PermissionBitsPolicy),
        });
        self.snowflake_generator = Some(Arc::new(generator));

        if let Some(redis) = &config.redis {
            let pool = RedisPool::from_config(redis).map_err(DomainError::from)?;
            self = self.redis(pool);
        }
        Ok(self)
    }

    /// Publish events through Redis Pub/Sub
    pub fn redis(self, pool: RedisPool) -> Self {
        self.notifier(Arc::new(RedisNotificationSink::new(pool)))
    }

    /// Use the PostgreSQL repositories over `pool`
    pub fn postgres(self, pool: &PgPool) -> Self {
        self.guild_repo(Arc::new(PgGuildRepository::new(pool.clone())))
            .role_repo(Arc::new(PgRoleRepository::new(pool.clone())))
            .member_repo(Arc::new(PgMemberRepository::new(pool.clone())))
            .ban_repo(Arc::new(PgBanRepository::new(pool.clone())))
            .invite_repo(Arc::new(PgInviteRepository::new(pool.clone())))
    }

    /// Use in-memory repositories sharing one store
    pub fn in_memory(self, repos: &InMemoryRepositories) -> Self {
        self.guild_repo(repos.guilds.clone())
            .role_repo(repos.roles.clone())
            .member_repo(repos.members.clone())
            .ban_repo(repos.bans.clone())
            .invite_repo(repos.invites.clone())
    }

    pub fn guild_repo(mut self, repo: Arc<dyn GuildRepository>) -> Self {
        self.guild_repo = Some(repo);
        self
    }

    pub fn role_repo(mut self, repo: Arc<dyn RoleRepository>) -> Self {
        self.role_repo = Some(repo);
        self
    }

    pub fn member_repo(mut self, repo: Arc<dyn MemberRepository>) -> Self {
        self.member_repo = Some(repo);
        self
    }

    pub fn ban_repo(mut self, repo: Arc<dyn BanRepository>) -> Self {
        self.ban_repo = Some(repo);
        self
    }

    pub fn invite_repo(mut self, repo: Arc<dyn InviteRepository>) -> Self {
        self.invite_repo = Some(repo);
        self
    }

    pub fn quota_oracle(mut self, oracle: Arc<dyn QuotaOracle>) -> Self {
        self.quota_oracle = Some(oracle);
        self
    }

    pub fn channel_provisioner(mut self, provisioner: Arc<dyn ChannelProvisioner>) -> Self {
        self.channel_provisioner = Some(provisioner);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn access_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.access_policy = Some(policy);
        self
    }

    pub fn invite_accounting(mut self, accounting: InviteAccounting) -> Self {
        self.invite_accounting = accounting;
        self
    }

    pub fn collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn baseline_permissions(mut self, permissions: Permissions) -> Self {
        self.baseline_permissions = permissions;
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a repository is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext {
            guild_repo: self
                .guild_repo
                .ok_or_else(|| ServiceError::validation("guild_repo is required"))?,
            role_repo: self
                .role_repo
                .ok_or_else(|| ServiceError::validation("role_repo is required"))?,
            member_repo: self
                .member_repo
                .ok_or_else(|| ServiceError::validation("member_repo is required"))?,
            ban_repo: self
                .ban_repo
                .ok_or_else(|| ServiceError::validation("ban_repo is required"))?,
            invite_repo: self
                .invite_repo
                .ok_or_else(|| ServiceError::validation("invite_repo is required"))?,
            quota_oracle: self
                .quota_oracle
                .unwrap_or_else(|| Arc::new(StaticQuotaOracle::unlimited())),
            channel_provisioner: self
                .channel_provisioner
                .unwrap_or_else(|| Arc::new(NoopChannelProvisioner)),
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(TracingNotificationSink)),
            access_policy: self
                .access_policy
                .unwrap_or_else(|| Arc::new(PermissionBitsPolicy)),
            invite_accounting: self.invite_accounting,
            collaborator_timeout: self.collaborator_timeout,
            baseline_permissions: self.baseline_permissions,
            snowflake_generator: self.snowflake_generator.unwrap_or_default(),
        })
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct SlowOracle;

    #[async_trait]
    impl QuotaOracle for SlowOracle {
        async fn effective_limits(
            &self,
            _user_id: Snowflake,
            _guild_id: Option<Snowflake>,
        ) -> RepoResult<QuotaLimits> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(QuotaLimits::UNLIMITED)
        }
    }

    struct DownSink;

    #[async_trait]
    impl NotificationSink for DownSink {
        async fn publish(&self, _event: DomainEvent) -> RepoResult<()> {
            Err(DomainError::CacheError("connection refused".to_string()))
        }
    }

    #[test]
    fn test_build_requires_repositories() {
        let err = ServiceContextBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("guild_repo is required"));
    }

    #[test]
    fn test_config_selects_policy_and_accounting() {
        let config = AppConfig::from_lookup(|key| match key {
            "ACCESS_POLICY" => Some("membership-only".to_string()),
            "INVITE_ACCOUNTING" => Some("strict".to_string()),
            _ => None,
        })
        .unwrap();

        let ctx = ServiceContext::builder()
            .in_memory(&InMemoryRepositories::new())
            .config(&config)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(ctx.access_policy().name(), "membership-only");
        assert_eq!(ctx.invite_accounting(), InviteAccounting::Strict);
    }

    #[tokio::test]
    async fn test_slow_collaborator_times_out() {
        let ctx = ServiceContext::builder()
            .in_memory(&InMemoryRepositories::new())
            .quota_oracle(Arc::new(SlowOracle))
            .collaborator_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let err = ctx.quota_limits(Snowflake::new(1), None).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Timeout {
                collaborator: "quota oracle",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let ctx = ServiceContext::builder()
            .in_memory(&InMemoryRepositories::new())
            .notifier(Arc::new(DownSink))
            .build()
            .unwrap();

        ctx.publish(DomainEvent::CommunityDeleted(
            guild_core::events::GuildEvent::new(Snowflake::new(9)),
        ))
        .await;
    }

    #[tokio::test]
    async fn test_detached_unit_outlives_cancelled_caller() {
        let ctx = ServiceContext::builder()
            .in_memory(&InMemoryRepositories::new())
            .build()
            .unwrap();
        let started = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        let caller = {
            let started = Arc::clone(&started);
            let release = Arc::clone(&release);
            tokio::spawn(async move {
                ctx.detached(move |_| async move {
                    started.notify_one();
                    release.notified().await;
                    let _ = done_tx.send(());
                    Ok::<(), ServiceError>(())
                })
                .await
            })
        };

        started.notified().await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        release.notify_one();
        assert!(done_rx.await.is_ok());
    }
}
