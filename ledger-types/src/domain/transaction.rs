//! Ledger transaction domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;
use super::owner::OwnerId;
use crate::error::DomainError;

/// Unique identifier for a Transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state of a ledger transaction.
///
/// `Completed` is terminal and ledger-visible. `Failed` and `Refunded` exist
/// for rows settled out of band (redirect callbacks, disputes) and never
/// carry wallet effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "PENDING"),
            TransactionStatus::Completed => write!(f, "COMPLETED"),
            TransactionStatus::Failed => write!(f, "FAILED"),
            TransactionStatus::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// How the sender side of a transfer was funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferKind {
    /// External provider charge; no sender wallet is debited.
    Charge,
    /// Peer-to-peer transfer funded from the sender's wallet.
    WalletTransfer,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::Charge => write!(f, "CHARGE"),
            TransferKind::WalletTransfer => write!(f, "WALLET_TRANSFER"),
        }
    }
}

/// A recorded money movement between two parties.
///
/// Transactions are immutable once Completed - they are the system's
/// source of truth; wallet balances are a projection of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// Paying party
    pub sender_id: OwnerId,
    /// Receiving party
    pub recipient_id: OwnerId,
    /// Gross amount moved
    pub amount: Money,
    /// Portion retained by the platform, never credited to either wallet
    pub platform_fee: Money,
    pub status: TransactionStatus,
    pub kind: TransferKind,
    /// Provider payment reference for external charges
    pub provider_ref: Option<String>,
    /// Idempotency key for duplicate-submission suppression
    pub request_key: Option<String>,
    /// Natural identity of the cause (listing, chat, ...)
    pub reference: Option<String>,
    /// When the transaction was recorded
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new Completed transaction, validating the ledger invariants:
    /// matching currencies, fee not exceeding the amount, distinct parties.
    #[allow(clippy::too_many_arguments)]
    pub fn completed(
        sender_id: OwnerId,
        recipient_id: OwnerId,
        amount: Money,
        platform_fee: Money,
        kind: TransferKind,
        provider_ref: Option<String>,
        request_key: Option<String>,
        reference: Option<String>,
    ) -> Result<Self, DomainError> {
        if sender_id == recipient_id {
            return Err(DomainError::SelfPayment);
        }
        if platform_fee.currency() != amount.currency() {
            return Err(DomainError::CurrencyMismatch {
                expected: amount.currency(),
                got: platform_fee.currency(),
            });
        }
        if platform_fee.amount() > amount.amount() {
            return Err(DomainError::FeeExceedsAmount {
                amount: amount.amount(),
                fee: platform_fee.amount(),
            });
        }

        Ok(Self {
            id: TransactionId::new(),
            sender_id,
            recipient_id,
            amount,
            platform_fee,
            status: TransactionStatus::Completed,
            kind,
            provider_ref,
            request_key,
            reference,
            created_at: Utc::now(),
        })
    }

    /// Reconstructs a transaction from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TransactionId,
        sender_id: OwnerId,
        recipient_id: OwnerId,
        amount: Money,
        platform_fee: Money,
        status: TransactionStatus,
        kind: TransferKind,
        provider_ref: Option<String>,
        request_key: Option<String>,
        reference: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sender_id,
            recipient_id,
            amount,
            platform_fee,
            status,
            kind,
            provider_ref,
            request_key,
            reference,
            created_at,
        }
    }

    /// Amount credited to the recipient: gross minus the platform fee.
    pub fn net_amount(&self) -> Money {
        // Constructors guarantee fee <= amount in the same currency.
        Money::new(
            self.amount.amount() - self.platform_fee.amount(),
            self.amount.currency(),
        )
        .unwrap_or_else(|_| Money::zero(self.amount.currency()))
    }

    /// True if this transaction involves the owner on either side.
    pub fn involves(&self, owner: OwnerId) -> bool {
        self.sender_id == owner || self.recipient_id == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    fn usd(amount: i64) -> Money {
        Money::new(amount, Currency::USD).unwrap()
    }

    #[test]
    fn test_completed_transaction() {
        let sender = OwnerId::new();
        let recipient = OwnerId::new();
        let tx = Transaction::completed(
            sender,
            recipient,
            usd(10000),
            usd(1000),
            TransferKind::Charge,
            Some("ch_123".into()),
            None,
            None,
        )
        .unwrap();

        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.net_amount().amount(), 9000);
        assert!(tx.involves(sender));
        assert!(tx.involves(recipient));
    }

    #[test]
    fn test_self_payment_rejected() {
        let owner = OwnerId::new();
        let result = Transaction::completed(
            owner,
            owner,
            usd(100),
            usd(0),
            TransferKind::WalletTransfer,
            None,
            None,
            None,
        );
        assert!(matches!(result, Err(DomainError::SelfPayment)));
    }

    #[test]
    fn test_fee_exceeding_amount_rejected() {
        let result = Transaction::completed(
            OwnerId::new(),
            OwnerId::new(),
            usd(100),
            usd(200),
            TransferKind::Charge,
            None,
            None,
            None,
        );
        assert!(matches!(result, Err(DomainError::FeeExceedsAmount { .. })));
    }
}
