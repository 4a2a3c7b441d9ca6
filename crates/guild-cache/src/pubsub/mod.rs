//! Redis Pub/Sub module.
//!
//! Publishes committed domain events for consumers in other processes.

mod channels;
mod publisher;

pub use channels::{PubSubChannel, GUILD_CHANNEL_PREFIX, USER_CHANNEL_PREFIX};
pub use publisher::{Publisher, RedisNotificationSink};
