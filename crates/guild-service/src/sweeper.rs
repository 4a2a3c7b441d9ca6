//! Background removal of expired invites

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::services::{InviteService, ServiceContext};

/// Periodically runs [`InviteService::sweep_expired`] until told to stop
pub struct InviteSweeper {
    ctx: ServiceContext,
    period: Duration,
}

impl InviteSweeper {
    pub fn new(ctx: ServiceContext, period: Duration) -> Self {
        Self { ctx, period }
    }

    /// One sweep; failures are logged and the next tick tries again
    pub async fn sweep_once(&self) -> u64 {
        match InviteService::new(&self.ctx).sweep_expired().await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(error = %err, "Invite sweep failed");
                0
            }
        }
    }

    /// Sweep on every tick until `shutdown` flips to true or its sender is gone
    ///
    /// Returns the total number of invites removed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut total = 0;

        info!(period_secs = self.period.as_secs(), "Invite sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep_once().await;
                    total += removed;
                    debug!(removed, total, "Invite sweep finished");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(total, "Invite sweeper stopped");
        total
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};
    use guild_core::Invite;

    use super::*;
    use crate::services::test_support::{Harness, OWNER};

    #[tokio::test]
    async fn test_run_sweeps_then_stops_on_signal() {
        let h = Harness::new();
        let guild = h.guild(OWNER).await;
        let mut stale = Invite::new("sweep001".to_string(), guild.id, guild.id, OWNER);
        stale.expires_at = Some(Utc::now() - ChronoDuration::seconds(1));
        h.ctx.invite_repo().create(&stale).await.unwrap();
        let live = Invite::new("sweep002".to_string(), guild.id, guild.id, OWNER);
        h.ctx.invite_repo().create(&live).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let sweeper = InviteSweeper::new(h.ctx.clone(), Duration::from_millis(10));
        let handle = tokio::spawn(sweeper.run(rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        let total = handle.await.unwrap();

        assert_eq!(total, 1);
        assert!(h.ctx.invite_repo().find_by_code("sweep002").await.unwrap().is_some());
        assert!(h.ctx.invite_repo().find_by_code("sweep001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_sweeper() {
        let h = Harness::new();
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let total = InviteSweeper::new(h.ctx.clone(), Duration::from_secs(3600))
            .run(rx)
            .await;
        assert_eq!(total, 0);
    }
}
