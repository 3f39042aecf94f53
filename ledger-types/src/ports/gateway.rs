//! Payment-provider capability traits.
//!
//! One implementation per external provider, behaviorally uniform to
//! callers. Gateways are stateless per call and never deduplicate;
//! idempotency is the service's responsibility.

use crate::domain::{Money, OwnerId, PaymentResult, TokenizedCard};
use crate::error::GatewayError;

/// A single external payment provider.
///
/// Provider-side business errors (declines, rejected charges) must be
/// normalized to a `Failed` [`PaymentResult`], never returned as errors.
/// `GatewayError::Transport` is reserved for network-level faults where no
/// provider verdict was received.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registered key of this provider.
    fn name(&self) -> &'static str;

    /// Initiates a redirect- or direct-charge payment. Safe for the caller
    /// to retry.
    async fn create_payment(
        &self,
        amount: Money,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<PaymentResult, GatewayError>;

    /// Finalizes/charges a previously authorized or stored instrument.
    /// Returns `Completed` only when the provider confirms settlement.
    async fn capture_payment(
        &self,
        payment_id: &str,
        customer_ref: &str,
        amount: Money,
        description: &str,
    ) -> Result<PaymentResult, GatewayError>;
}

/// Exchange of one-time card tokens for durable instruments, offered by
/// providers that support stored cards.
#[async_trait::async_trait]
pub trait CardTokenizer: Send + Sync {
    /// Exchanges a one-time token for a durable tokenized card. A token the
    /// provider rejects surfaces as `GatewayError::InvalidToken`.
    async fn exchange_token(
        &self,
        owner: OwnerId,
        one_time_token: &str,
    ) -> Result<TokenizedCard, GatewayError>;
}
