//! Notification outbox events.
//!
//! Completed payments enqueue an event row in the same database transaction
//! as the ledger write; a relay worker delivers them fire-and-forget, so a
//! delivery failure can never roll a payment back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NotificationStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AsRef<str> for NotificationStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub attempts: i32,
    pub last_error: Option<String>,
}

impl NotificationEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            payload,
            status: NotificationStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
            attempts: 0,
            last_error: None,
        }
    }

    /// Event announcing a completed payment to both parties.
    pub fn payment_completed(tx: &Transaction) -> Self {
        Self::new(
            "payment.completed",
            serde_json::json!({
                "transaction_id": tx.id,
                "sender_id": tx.sender_id,
                "recipient_id": tx.recipient_id,
                "amount": tx.amount.amount(),
                "platform_fee": tx.platform_fee.amount(),
                "currency": tx.amount.currency(),
            }),
        )
    }
}
