//! Ledger engine daemon.
//!
//! Connects to the configured database, runs migrations and drives the
//! notification outbox relay. The engine itself is consumed as a library;
//! this binary covers the pieces that need a long-running process.

mod config;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ledger_store::notifications::NotificationWorker;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(database_url = %config.database_url, "starting ledger daemon");

    let store = Arc::new(ledger_store::build_store(&config.database_url).await?);
    info!("database ready");

    match (config.notify_url, config.notify_secret) {
        (Some(url), Some(secret)) => {
            NotificationWorker::new(store, url, secret).run().await;
        }
        _ => {
            warn!("NOTIFY_URL not configured; nothing to do after migrations");
        }
    }

    Ok(())
}
