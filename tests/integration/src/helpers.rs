//! Test helpers for integration tests
//!
//! A [`World`] bundles a service context with the recording sink so tests
//! can drive services and inspect published events.

use std::sync::Arc;

use anyhow::{Context, Result};
use guild_common::DatabaseConfig;
use guild_core::{DomainError, Snowflake};
use guild_db::{create_pool, run_migrations, InMemoryRepositories};
use guild_service::dto::{CreateGuildRequest, CreateInviteRequest, GuildResponse};
use guild_service::{
    GuildService, InviteService, RecordingSink, ServiceContext, ServiceContextBuilder,
    ServiceError,
};

pub struct World {
    pub ctx: ServiceContext,
    pub sink: Arc<RecordingSink>,
    /// Present for in-memory worlds, used for fault injection
    pub repos: Option<InMemoryRepositories>,
}

impl World {
    pub fn in_memory() -> Self {
        Self::in_memory_with(|builder| builder)
    }

    pub fn in_memory_with(
        configure: impl FnOnce(ServiceContextBuilder) -> ServiceContextBuilder,
    ) -> Self {
        let repos = InMemoryRepositories::new();
        let sink = Arc::new(RecordingSink::new());
        let builder = ServiceContext::builder()
            .in_memory(&repos)
            .notifier(sink.clone());
        let ctx = configure(builder)
            .build()
            .unwrap_or_else(|e| panic!("in-memory context: {e}"));
        Self {
            ctx,
            sink,
            repos: Some(repos),
        }
    }

    /// World backed by PostgreSQL, or `None` when `DATABASE_URL` is unset
    pub async fn postgres() -> Result<Option<Self>> {
        dotenvy::dotenv().ok();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return Ok(None);
        };

        let config = DatabaseConfig {
            url,
            max_connections: 5,
            min_connections: 1,
        };
        let pool = create_pool(&config).await.context("connecting")?;
        run_migrations(&pool).await.context("migrating")?;

        let sink = Arc::new(RecordingSink::new());
        let ctx = ServiceContext::builder()
            .postgres(&pool)
            .notifier(sink.clone())
            .build()?;
        Ok(Some(Self {
            ctx,
            sink,
            repos: None,
        }))
    }

    /// A fresh identity nobody has seen yet
    pub fn user(&self) -> Snowflake {
        self.ctx.generate_id()
    }

    pub async fn community(&self, owner: Snowflake) -> GuildResponse {
        GuildService::new(&self.ctx)
            .create_guild(owner, CreateGuildRequest::named("Integration Guild"))
            .await
            .unwrap_or_else(|e| panic!("create guild: {e}"))
    }

    pub async fn invite(&self, guild_id: Snowflake, inviter: Snowflake, max_uses: u32) -> String {
        InviteService::new(&self.ctx)
            .create_invite(
                guild_id,
                inviter,
                CreateInviteRequest::default().with_max_uses(max_uses),
            )
            .await
            .unwrap_or_else(|e| panic!("create invite: {e}"))
            .code
    }
}

/// Domain error inside a service error, panicking on anything else
pub fn domain(err: ServiceError) -> DomainError {
    match err {
        ServiceError::Domain(e) => e,
        other => panic!("expected a domain error, got {other}"),
    }
}
