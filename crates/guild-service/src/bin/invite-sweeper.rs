//! Invite sweeper
//!
//! Deletes expired invites on a fixed interval until interrupted.
//!
//! Run with:
//! ```bash
//! cargo run -p guild-service --bin invite-sweeper
//! ```

use anyhow::Context;
use guild_common::{init_tracing, AppConfig, TracingConfig};
use guild_db::{create_pool, run_migrations};
use guild_service::{InviteSweeper, ServiceContext};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = format!("{e:#}"), "Invite sweeper failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;

    if let Err(e) = init_tracing(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let database = config.require_database()?;
    let pool = create_pool(database)
        .await
        .context("connecting to PostgreSQL")?;
    run_migrations(&pool).await.context("running migrations")?;

    let ctx = ServiceContext::builder()
        .postgres(&pool)
        .config(&config)?
        .build()?;

    let period = config.membership.invite_sweep_interval();
    info!(env = ?config.app.env, period_secs = period.as_secs(), "Configuration loaded");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = tokio::spawn(InviteSweeper::new(ctx, period).run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    let removed = sweeper.await.context("sweeper task")?;
    info!(removed, "Invite sweeper exited");
    Ok(())
}
