//! Ledger store port.
//!
//! The primary port of the engine. All operations that move money MUST be
//! atomic: a transfer is one database transaction covering the transaction
//! insert, the wallet adjustments and the notification enqueue, visible
//! all-or-nothing.

use crate::domain::{
    BillingFrequency, Money, OwnerId, Subscription, Transaction, TransactionId, TransferKind,
    Wallet,
};
use crate::error::StoreError;

/// Everything needed to record one completed money movement.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub sender_id: OwnerId,
    pub recipient_id: OwnerId,
    /// Gross amount moved from sender to recipient
    pub amount: Money,
    /// Retained by the platform; the recipient is credited amount − fee
    pub platform_fee: Money,
    /// `WalletTransfer` additionally debits the sender's wallet
    pub kind: TransferKind,
    /// Provider payment reference for external charges
    pub provider_ref: Option<String>,
    /// Idempotency key; the store performs an atomic conditional insert on
    /// it so concurrent duplicates collapse to a single row
    pub request_key: Option<String>,
    pub reference: Option<String>,
}

/// A subscription paired with the transfer paying its first period.
#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    pub owner_id: OwnerId,
    pub recipient_id: OwnerId,
    pub amount: Money,
    pub payment_method: String,
    pub billing_frequency: BillingFrequency,
    pub provider_ref: Option<String>,
    pub request_key: Option<String>,
}

/// The ledger/wallet persistence port.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Records a completed transfer as one atomic unit:
    /// 1. conditionally insert the Completed transaction row (no-op when the
    ///    request key already exists - the existing row is returned and the
    ///    wallets are untouched);
    /// 2. credit the recipient's wallet with `amount − platform_fee`,
    ///    creating the wallet if absent;
    /// 3. for wallet-funded transfers, debit the sender's wallet by
    ///    `amount`, failing the whole unit on insufficient funds.
    ///
    /// Concurrent mutation of the same wallet surfaces as
    /// `StoreError::Conflict`; callers retry the unit.
    async fn record_transfer(&self, rec: TransferRecord) -> Result<Transaction, StoreError>;

    /// Finds a transaction by its idempotency key.
    async fn find_by_request_key(&self, key: &str) -> Result<Option<Transaction>, StoreError>;

    /// Gets a transaction by ID.
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Gets the owner's wallet, if one has been created.
    async fn get_wallet(&self, owner: OwnerId) -> Result<Option<Wallet>, StoreError>;

    /// Lists all transactions the owner is a party to, newest first. Reads
    /// are read-after-write consistent per owner.
    async fn transactions_for_owner(&self, owner: OwnerId)
    -> Result<Vec<Transaction>, StoreError>;

    /// Atomically records a subscription together with its originating
    /// transfer; both rows commit or neither does.
    async fn create_subscription(
        &self,
        rec: SubscriptionRecord,
    ) -> Result<(Subscription, Transaction), StoreError>;
}
