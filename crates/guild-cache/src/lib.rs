//! # guild-cache
//!
//! Redis layer for fanning membership events out to other processes.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: Domain events published on `guild:{id}` and `user:{id}` channels
//!
//! ## Example
//!
//! ```ignore
//! use guild_cache::{RedisNotificationSink, RedisPool};
//!
//! let pool = RedisPool::from_config(config.redis.as_ref().unwrap())?;
//! let sink = RedisNotificationSink::new(pool);
//! sink.publish(event).await?;
//! ```

pub mod pool;
pub mod pubsub;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    PubSubChannel, Publisher, RedisNotificationSink, GUILD_CHANNEL_PREFIX, USER_CHANNEL_PREFIX,
};
