//! Subscription domain model.
//!
//! The engine only records the subscription together with its originating
//! transaction; billing-cycle scheduling happens elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;
use super::owner::OwnerId;
use super::transaction::TransactionId;

/// Unique identifier for a Subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How often the subscription bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingFrequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl std::fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingFrequency::Weekly => write!(f, "WEEKLY"),
            BillingFrequency::Monthly => write!(f, "MONTHLY"),
            BillingFrequency::Quarterly => write!(f, "QUARTERLY"),
            BillingFrequency::Yearly => write!(f, "YEARLY"),
        }
    }
}

/// A recorded subscription, always paired with the transaction that paid
/// for its first period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub owner_id: OwnerId,
    pub amount: Money,
    /// Stored instrument used to pay (provider card token or "wallet")
    pub payment_method: String,
    pub billing_frequency: BillingFrequency,
    /// The originating transaction; present on every successful creation
    pub transaction_id: TransactionId,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(
        owner_id: OwnerId,
        amount: Money,
        payment_method: String,
        billing_frequency: BillingFrequency,
        transaction_id: TransactionId,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            owner_id,
            amount,
            payment_method,
            billing_frequency,
            transaction_id,
            created_at: Utc::now(),
        }
    }

    /// Reconstructs a subscription from database fields.
    pub fn from_parts(
        id: SubscriptionId,
        owner_id: OwnerId,
        amount: Money,
        payment_method: String,
        billing_frequency: BillingFrequency,
        transaction_id: TransactionId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            amount,
            payment_method,
            billing_frequency,
            transaction_id,
            created_at,
        }
    }
}
