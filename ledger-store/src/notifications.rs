//! Notification outbox relay.
//!
//! Polls the `notification_events` table and delivers pending events to the
//! configured endpoint, signing each body so the receiver can authenticate
//! it. Delivery runs outside any ledger transaction; a failed POST only
//! reschedules the event.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use ledger_types::{NotificationEvent, NotificationStatus};

use crate::Store;
use crate::signing::sign_notification;

/// Signature header attached to every delivery.
pub const SIGNATURE_HEADER: &str = "X-Ledger-Signature";

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const BATCH_SIZE: i64 = 25;
const MAX_ATTEMPTS: i32 = 5;

#[derive(Serialize)]
struct Delivery<'a> {
    id: uuid::Uuid,
    event_type: &'a str,
    payload: &'a serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Delivers outbox events to a single notification endpoint.
pub struct NotificationWorker {
    store: Arc<Store>,
    client: reqwest::Client,
    target_url: String,
    secret: String,
}

impl NotificationWorker {
    pub fn new(store: Arc<Store>, target_url: String, secret: String) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
            target_url,
            secret,
        }
    }

    /// Runs the relay loop until the process exits.
    pub async fn run(self) {
        info!(target_url = %self.target_url, "notification relay started");
        let mut tick = tokio::time::interval(POLL_INTERVAL);
        loop {
            tick.tick().await;
            if let Err(e) = self.drain_pending().await {
                error!(error = %e, "notification batch failed");
            }
        }
    }

    /// Delivers one batch of pending events.
    pub async fn drain_pending(&self) -> anyhow::Result<()> {
        let events = self.store.get_pending_notifications(BATCH_SIZE).await?;
        if events.is_empty() {
            return Ok(());
        }
        debug!(count = events.len(), "delivering pending notifications");

        for event in events {
            self.deliver(event).await?;
        }
        Ok(())
    }

    async fn deliver(&self, event: NotificationEvent) -> anyhow::Result<()> {
        let body = serde_json::to_vec(&Delivery {
            id: event.id,
            event_type: &event.event_type,
            payload: &event.payload,
            created_at: event.created_at,
        })?;
        let signature = sign_notification(&self.secret, &body);

        let result = self
            .client
            .post(&self.target_url)
            .header(SIGNATURE_HEADER, signature)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await;

        let status = match result {
            Ok(resp) if resp.status().is_success() => {
                debug!(event_id = %event.id, event_type = %event.event_type, "notification delivered");
                (NotificationStatus::Completed, None)
            }
            Ok(resp) => self.failure(&event, format!("endpoint returned {}", resp.status())),
            Err(e) => self.failure(&event, e.to_string()),
        };

        self.store
            .update_notification_status(event.id, status.0, status.1)
            .await?;
        Ok(())
    }

    fn failure(
        &self,
        event: &NotificationEvent,
        reason: String,
    ) -> (NotificationStatus, Option<String>) {
        if event.attempts + 1 >= MAX_ATTEMPTS {
            warn!(event_id = %event.id, attempts = event.attempts + 1, reason = %reason,
                "notification exhausted retries");
            (NotificationStatus::Failed, Some(reason))
        } else {
            debug!(event_id = %event.id, reason = %reason, "notification delivery failed, will retry");
            (NotificationStatus::Pending, Some(reason))
        }
    }
}
