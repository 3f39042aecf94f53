//! Shared database types with feature-gated fields for SQLite and PostgreSQL.

use sqlx::FromRow;

use ledger_types::{
    BillingFrequency, CardId, CardPurpose, Currency, Money, NotificationEvent, NotificationStatus,
    OwnerId, StoreError, Subscription, SubscriptionId, Transaction, TransactionId,
    TransactionStatus, TransferKind, UserCard, Wallet,
};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(feature = "sqlite"))]
use chrono::{DateTime, Utc};
#[cfg(not(feature = "sqlite"))]
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_currency(s: &str) -> Result<Currency, StoreError> {
    match s {
        "USD" => Ok(Currency::USD),
        "EUR" => Ok(Currency::EUR),
        "GBP" => Ok(Currency::GBP),
        "INR" => Ok(Currency::INR),
        _ => Err(StoreError::Database(format!("Unknown currency: {}", s))),
    }
}

pub fn parse_status(s: &str) -> Result<TransactionStatus, StoreError> {
    match s {
        "PENDING" => Ok(TransactionStatus::Pending),
        "COMPLETED" => Ok(TransactionStatus::Completed),
        "FAILED" => Ok(TransactionStatus::Failed),
        "REFUNDED" => Ok(TransactionStatus::Refunded),
        _ => Err(StoreError::Database(format!(
            "Unknown transaction status: {}",
            s
        ))),
    }
}

pub fn parse_kind(s: &str) -> Result<TransferKind, StoreError> {
    match s {
        "CHARGE" => Ok(TransferKind::Charge),
        "WALLET_TRANSFER" => Ok(TransferKind::WalletTransfer),
        _ => Err(StoreError::Database(format!(
            "Unknown transfer kind: {}",
            s
        ))),
    }
}

pub fn parse_purpose(s: &str) -> Result<CardPurpose, StoreError> {
    match s {
        "PAYING" => Ok(CardPurpose::Paying),
        "RECEIVING" => Ok(CardPurpose::Receiving),
        _ => Err(StoreError::Database(format!("Unknown card purpose: {}", s))),
    }
}

pub fn parse_frequency(s: &str) -> Result<BillingFrequency, StoreError> {
    match s {
        "WEEKLY" => Ok(BillingFrequency::Weekly),
        "MONTHLY" => Ok(BillingFrequency::Monthly),
        "QUARTERLY" => Ok(BillingFrequency::Quarterly),
        "YEARLY" => Ok(BillingFrequency::Yearly),
        _ => Err(StoreError::Database(format!(
            "Unknown billing frequency: {}",
            s
        ))),
    }
}

#[cfg(feature = "sqlite")]
fn parse_uuid(s: &str) -> Result<uuid::Uuid, StoreError> {
    uuid::Uuid::parse_str(s).map_err(|e| StoreError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
fn parse_datetime(s: &str) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| StoreError::Database(e.to_string()))
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Wallet row from database.
#[derive(FromRow)]
pub struct DbWallet {
    #[cfg(not(feature = "sqlite"))]
    pub owner_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub owner_id: String,

    pub balance: i64,
    pub currency: String,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

impl DbWallet {
    pub fn into_domain(self) -> Result<Wallet, StoreError> {
        let currency = parse_currency(&self.currency)?;
        let balance = Money::new(self.balance, currency).map_err(StoreError::Domain)?;

        #[cfg(not(feature = "sqlite"))]
        let (owner_id, created_at) = (OwnerId::from_uuid(self.owner_id), self.created_at);

        #[cfg(feature = "sqlite")]
        let (owner_id, created_at) = (
            OwnerId::from_uuid(parse_uuid(&self.owner_id)?),
            parse_datetime(&self.created_at)?,
        );

        Ok(Wallet::from_parts(owner_id, balance, created_at))
    }
}

/// Transaction row from database.
#[derive(FromRow)]
pub struct DbTransaction {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    #[cfg(not(feature = "sqlite"))]
    pub sender_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub sender_id: String,

    #[cfg(not(feature = "sqlite"))]
    pub recipient_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub recipient_id: String,

    pub amount: i64,
    pub platform_fee: i64,
    pub currency: String,
    pub status: String,
    pub kind: String,
    pub provider_ref: Option<String>,
    pub request_key: Option<String>,
    pub reference: Option<String>,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

impl DbTransaction {
    pub fn into_domain(self) -> Result<Transaction, StoreError> {
        let currency = parse_currency(&self.currency)?;
        let status = parse_status(&self.status)?;
        let kind = parse_kind(&self.kind)?;
        let amount = Money::new(self.amount, currency).map_err(StoreError::Domain)?;
        let platform_fee = Money::new(self.platform_fee, currency).map_err(StoreError::Domain)?;

        #[cfg(not(feature = "sqlite"))]
        let (id, sender_id, recipient_id, created_at) = (
            TransactionId::from_uuid(self.id),
            OwnerId::from_uuid(self.sender_id),
            OwnerId::from_uuid(self.recipient_id),
            self.created_at,
        );

        #[cfg(feature = "sqlite")]
        let (id, sender_id, recipient_id, created_at) = (
            TransactionId::from_uuid(parse_uuid(&self.id)?),
            OwnerId::from_uuid(parse_uuid(&self.sender_id)?),
            OwnerId::from_uuid(parse_uuid(&self.recipient_id)?),
            parse_datetime(&self.created_at)?,
        );

        Ok(Transaction::from_parts(
            id,
            sender_id,
            recipient_id,
            amount,
            platform_fee,
            status,
            kind,
            self.provider_ref,
            self.request_key,
            self.reference,
            created_at,
        ))
    }
}

/// Card row from database.
#[derive(FromRow)]
pub struct DbUserCard {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    #[cfg(not(feature = "sqlite"))]
    pub owner_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub owner_id: String,

    pub last4: String,
    pub exp_month: i32,
    pub exp_year: i32,
    pub brand: String,
    pub purpose: String,
    pub provider_token: String,
    pub customer_ref: String,

    #[cfg(not(feature = "sqlite"))]
    pub is_active: bool,
    #[cfg(feature = "sqlite")]
    pub is_active: i64,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

impl DbUserCard {
    pub fn into_domain(self) -> Result<UserCard, StoreError> {
        let purpose = parse_purpose(&self.purpose)?;

        #[cfg(not(feature = "sqlite"))]
        let (id, owner_id, is_active, created_at) = (
            CardId::from_uuid(self.id),
            OwnerId::from_uuid(self.owner_id),
            self.is_active,
            self.created_at,
        );

        #[cfg(feature = "sqlite")]
        let (id, owner_id, is_active, created_at) = (
            CardId::from_uuid(parse_uuid(&self.id)?),
            OwnerId::from_uuid(parse_uuid(&self.owner_id)?),
            self.is_active != 0,
            parse_datetime(&self.created_at)?,
        );

        Ok(UserCard::from_parts(
            id,
            owner_id,
            self.last4,
            self.exp_month,
            self.exp_year,
            self.brand,
            purpose,
            self.provider_token,
            self.customer_ref,
            is_active,
            created_at,
        ))
    }
}

/// Subscription row from database.
#[derive(FromRow)]
pub struct DbSubscription {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    #[cfg(not(feature = "sqlite"))]
    pub owner_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub owner_id: String,

    pub amount: i64,
    pub currency: String,
    pub payment_method: String,
    pub billing_frequency: String,

    #[cfg(not(feature = "sqlite"))]
    pub transaction_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub transaction_id: String,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

impl DbSubscription {
    pub fn into_domain(self) -> Result<Subscription, StoreError> {
        let currency = parse_currency(&self.currency)?;
        let amount = Money::new(self.amount, currency).map_err(StoreError::Domain)?;
        let billing_frequency = parse_frequency(&self.billing_frequency)?;

        #[cfg(not(feature = "sqlite"))]
        let (id, owner_id, transaction_id, created_at) = (
            SubscriptionId::from_uuid(self.id),
            OwnerId::from_uuid(self.owner_id),
            TransactionId::from_uuid(self.transaction_id),
            self.created_at,
        );

        #[cfg(feature = "sqlite")]
        let (id, owner_id, transaction_id, created_at) = (
            SubscriptionId::from_uuid(parse_uuid(&self.id)?),
            OwnerId::from_uuid(parse_uuid(&self.owner_id)?),
            TransactionId::from_uuid(parse_uuid(&self.transaction_id)?),
            parse_datetime(&self.created_at)?,
        );

        Ok(Subscription::from_parts(
            id,
            owner_id,
            amount,
            self.payment_method,
            billing_frequency,
            transaction_id,
            created_at,
        ))
    }
}

/// Notification event row from database.
#[derive(FromRow)]
pub struct DbNotificationEvent {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    pub event_type: String,

    #[cfg(not(feature = "sqlite"))]
    pub payload: serde_json::Value,
    #[cfg(feature = "sqlite")]
    pub payload: String,

    pub status: String,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,

    #[cfg(not(feature = "sqlite"))]
    pub processed_at: Option<DateTime<Utc>>,
    #[cfg(feature = "sqlite")]
    pub processed_at: Option<String>,

    pub attempts: i32,
    pub last_error: Option<String>,
}

impl DbNotificationEvent {
    pub fn into_domain(self) -> Result<NotificationEvent, StoreError> {
        let status = match self.status.as_str() {
            "PROCESSING" => NotificationStatus::Processing,
            "COMPLETED" => NotificationStatus::Completed,
            "FAILED" => NotificationStatus::Failed,
            _ => NotificationStatus::Pending,
        };

        #[cfg(not(feature = "sqlite"))]
        let (id, payload, created_at, processed_at) =
            (self.id, self.payload, self.created_at, self.processed_at);

        #[cfg(feature = "sqlite")]
        let (id, payload, created_at, processed_at) = {
            let payload: serde_json::Value = serde_json::from_str(&self.payload)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            let processed_at = self.processed_at.as_deref().map(parse_datetime).transpose()?;
            (
                parse_uuid(&self.id)?,
                payload,
                parse_datetime(&self.created_at)?,
                processed_at,
            )
        };

        Ok(NotificationEvent {
            id,
            event_type: self.event_type,
            payload,
            status,
            created_at,
            processed_at,
            attempts: self.attempts,
            last_error: self.last_error,
        })
    }
}

/// Balance and currency row for queries.
#[derive(FromRow)]
pub struct DbWalletBalance {
    pub balance: i64,
    pub currency: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Maps a sqlx error to a StoreError, separating wallet-contention
/// conflicts (serialization failures, deadlocks, SQLITE_BUSY) from plain
/// database failures so the service can retry the atomic unit.
pub(crate) fn map_db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        let code = db.code().map(|c| c.to_string()).unwrap_or_default();
        let msg = db.message().to_string();
        if code == "40001" || code == "40P01" || code == "5" || msg.contains("database is locked")
        {
            return StoreError::Conflict(msg);
        }
        return StoreError::Database(msg);
    }
    StoreError::Database(e.to_string())
}
