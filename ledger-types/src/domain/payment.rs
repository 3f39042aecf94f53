//! Normalized payment-provider results.
//!
//! Every gateway adapter maps its provider's wire format into
//! [`PaymentResult`]. Business-level failures (declines, rejected charges)
//! are a `Failed` result, never an error - callers always receive a
//! structured outcome for an attempt that reached the provider.

use serde::{Deserialize, Serialize};

/// Outcome of a single gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentResultStatus {
    /// Provider accepted the intent but settlement is not confirmed
    /// (redirect-based flows waiting on approval).
    Pending,
    /// Provider confirmed settlement.
    Completed,
    /// Provider rejected the attempt.
    Failed,
}

impl std::fmt::Display for PaymentResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentResultStatus::Pending => write!(f, "PENDING"),
            PaymentResultStatus::Completed => write!(f, "COMPLETED"),
            PaymentResultStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Provider-agnostic result of a create or capture call.
///
/// Never mutated after the gateway returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    /// Opaque provider reference; None when the provider rejected the attempt.
    pub payment_id: Option<String>,
    /// Redirect URL, present only for approval-based flows.
    pub approval_url: Option<String>,
    pub status: PaymentResultStatus,
}

impl PaymentResult {
    /// A settled payment.
    pub fn completed(payment_id: impl Into<String>) -> Self {
        Self {
            payment_id: Some(payment_id.into()),
            approval_url: None,
            status: PaymentResultStatus::Completed,
        }
    }

    /// An initiated payment awaiting approval at the given URL.
    pub fn pending(payment_id: impl Into<String>, approval_url: Option<String>) -> Self {
        Self {
            payment_id: Some(payment_id.into()),
            approval_url,
            status: PaymentResultStatus::Pending,
        }
    }

    /// A provider-side rejection, normalized.
    pub fn failed() -> Self {
        Self {
            payment_id: None,
            approval_url: None,
            status: PaymentResultStatus::Failed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentResultStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_has_no_payment_id() {
        let result = PaymentResult::failed();
        assert!(result.payment_id.is_none());
        assert!(result.approval_url.is_none());
        assert_eq!(result.status, PaymentResultStatus::Failed);
    }

    #[test]
    fn test_completed_result() {
        let result = PaymentResult::completed("ch_123");
        assert!(result.is_completed());
        assert_eq!(result.payment_id.as_deref(), Some("ch_123"));
    }
}
