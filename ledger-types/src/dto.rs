//! Data Transfer Objects for the service boundary.
//!
//! Amounts cross the boundary as raw minor-unit integers plus a currency
//! and are validated into `Money` by the service.

use serde::{Deserialize, Serialize};

use crate::domain::{
    BillingFrequency, CardPurpose, Currency, OwnerId, PaymentResult, SubscriptionId, Transaction,
    TransactionId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to initiate a payment with a named provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in smallest currency unit
    pub amount: i64,
    pub currency: Currency,
    /// Where the provider redirects after approval
    pub return_url: String,
    /// Where the provider redirects on cancellation
    pub cancel_url: String,
    /// Registered gateway key ("Stripe", "PayPal", ...)
    pub gateway: String,
}

/// Request to capture a payment against a stored instrument and record it
/// on the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub sender_id: OwnerId,
    pub recipient_id: OwnerId,
    /// Gross amount in smallest currency unit
    pub amount: i64,
    pub currency: Currency,
    /// Platform fee in smallest currency unit, retained by the platform
    pub platform_fee: i64,
    /// Registered gateway key
    pub gateway: String,
    /// Stored instrument to charge (a card's provider token)
    pub payment_method: String,
    /// Provider customer the instrument is attached to
    pub customer_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicit idempotency key; derived from the reference when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_key: Option<String>,
    /// Natural identity of the cause (listing id, chat id, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Request for a peer-to-peer transfer funded from the sender's wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletPaymentRequest {
    pub sender_id: OwnerId,
    pub recipient_id: OwnerId,
    pub amount: i64,
    pub currency: Currency,
    pub platform_fee: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Card DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to exchange a one-time provider token for a stored card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCardRequest {
    pub one_time_token: String,
    pub purpose: CardPurpose,
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscription DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a subscription and charge its first period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub owner_id: OwnerId,
    /// The platform's receiving party for subscription revenue
    pub recipient_id: OwnerId,
    pub amount: i64,
    pub currency: Currency,
    pub gateway: String,
    /// Stored instrument charged for the first period
    pub payment_method: String,
    /// Provider customer reference the instrument belongs to
    pub customer_ref: String,
    pub billing_frequency: BillingFrequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_key: Option<String>,
}

/// Result of a successful subscription creation: both ids are always
/// present, reflecting the atomically created pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionReceipt {
    pub subscription_id: SubscriptionId,
    pub transaction_id: TransactionId,
    pub payment: PaymentResult,
}

// ─────────────────────────────────────────────────────────────────────────────
// History DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Projection of the ledger for one owner: current wallet balance plus all
/// transactions the owner is a party to, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHistory {
    /// Current balance in smallest currency unit; zero when no wallet
    /// exists yet
    pub wallet_balance: i64,
    pub transactions: Vec<Transaction>,
}
