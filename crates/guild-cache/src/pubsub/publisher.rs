//! Redis Pub/Sub publisher.

use async_trait::async_trait;
use redis::AsyncCommands;

use guild_core::{DomainEvent, NotificationSink, RepoResult};

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;

/// Publishes serialized domain events
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event on one channel, returning the receiver count
    pub async fn publish(&self, channel: &PubSubChannel, event: &DomainEvent) -> RedisResult<u32> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = event.event_type(),
            receivers,
            "Published event"
        );

        Ok(receivers)
    }

    /// Publish an event on every channel it routes to
    pub async fn publish_routed(&self, event: &DomainEvent) -> RedisResult<u32> {
        let payload = serde_json::to_string(event)?;
        let channels = PubSubChannel::for_event(event);
        let mut conn = self.pool.get().await?;
        let mut total_receivers = 0;

        for channel in &channels {
            let receivers: u32 = conn.publish(channel.name(), &payload).await?;
            total_receivers += receivers;
        }

        tracing::debug!(
            channels = channels.len(),
            event_type = event.event_type(),
            total_receivers,
            "Published event to routed channels"
        );

        Ok(total_receivers)
    }
}

/// [`NotificationSink`] backed by Redis Pub/Sub
#[derive(Clone)]
pub struct RedisNotificationSink {
    publisher: Publisher,
}

impl RedisNotificationSink {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self {
            publisher: Publisher::new(pool),
        }
    }
}

#[async_trait]
impl NotificationSink for RedisNotificationSink {
    async fn publish(&self, event: DomainEvent) -> RepoResult<()> {
        self.publisher.publish_routed(&event).await?;
        Ok(())
    }
}
