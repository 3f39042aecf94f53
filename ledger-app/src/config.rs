//! Environment configuration.

use anyhow::Context;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection string (`sqlite://...` or `postgres://...`).
    pub database_url: String,
    /// Endpoint the notification relay delivers to. Relay is disabled when
    /// unset.
    pub notify_url: Option<String>,
    /// Shared secret for signing notification bodies.
    pub notify_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let notify_url = std::env::var("NOTIFY_URL").ok();
        let notify_secret = std::env::var("NOTIFY_SECRET").ok();

        if notify_url.is_some() && notify_secret.is_none() {
            anyhow::bail!("NOTIFY_SECRET must be set when NOTIFY_URL is configured");
        }

        Ok(Self {
            database_url,
            notify_url,
            notify_secret,
        })
    }
}
