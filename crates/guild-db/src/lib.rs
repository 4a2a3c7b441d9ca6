//! # guild-db
//!
//! Persistence layer implementing the guild-core repository traits.
//!
//! ## Overview
//!
//! - PostgreSQL repositories over SQLx, with models and mappers
//! - Connection pool creation and migrations
//! - In-memory repositories sharing one concurrent store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guild_common::AppConfig;
//! use guild_db::{create_pool, run_migrations, PgGuildRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pool = create_pool(config.require_database()?).await?;
//!     run_migrations(&pool).await?;
//!     let guilds = PgGuildRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{
    FaultPoint, InMemoryBanRepository, InMemoryGuildRepository, InMemoryInviteRepository,
    InMemoryMemberRepository, InMemoryRepositories, InMemoryRoleRepository, MemoryStore,
};
pub use pool::{create_pool, create_pool_with, run_migrations, PgPool, PoolOptions};
pub use repositories::{
    PgBanRepository, PgGuildRepository, PgInviteRepository, PgMemberRepository, PgRoleRepository,
};
