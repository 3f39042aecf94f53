//! Error types for the ledger engine.
//!
//! Business outcomes of a payment attempt are never errors - they are
//! structured `PaymentResult`s. The types here cover faults: invariant
//! violations, unknown providers, rejected tokens, transport failures and
//! storage conflicts.

use crate::domain::{Currency, OwnerId};

/// Domain-level errors (business invariant violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: Currency, got: Currency },

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("Platform fee {fee} exceeds amount {amount}")]
    FeeExceedsAmount { amount: i64, fee: i64 },

    #[error("Sender and recipient must be different parties")]
    SelfPayment,

    #[error("Wallet not found for owner: {0}")]
    WalletNotFound(OwnerId),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Gateway-boundary errors.
///
/// Provider-side business rejections are NOT here - those normalize to a
/// `Failed` PaymentResult at the adapter. These are the fault classes the
/// caller must distinguish.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Requested provider key matches no registered gateway. Configuration
    /// error, not retried.
    #[error("Unknown payment gateway: {0}")]
    UnknownGateway(String),

    /// Provider rejected a one-time card token; the payer must re-enter
    /// payment details.
    #[error("Provider rejected card token: {0}")]
    InvalidToken(String),

    /// Network-level failure before a provider verdict. Safe to retry with
    /// the same idempotency key - no ledger row was written.
    #[error("Gateway transport fault: {0}")]
    Transport(String),
}

/// Store-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    /// Concurrent mutation on the same wallet row; the service retries the
    /// atomic unit a bounded number of times.
    #[error("Ledger write conflict: {0}")]
    Conflict(String),
}

/// Caller-facing errors surfaced by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unknown payment gateway: {0}")]
    UnknownGateway(String),

    #[error("Invalid card token: {0}")]
    InvalidToken(String),

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(DomainError::InsufficientFunds {
                available,
                requested,
            }) => ServiceError::InsufficientFunds {
                available,
                requested,
            },
            StoreError::Domain(DomainError::WalletNotFound(id)) => {
                ServiceError::NotFound(format!("Wallet for owner {}", id))
            }
            StoreError::Domain(e) => ServiceError::BadRequest(e.to_string()),
            StoreError::NotFound => ServiceError::NotFound("Resource not found".into()),
            StoreError::Database(e) => ServiceError::Internal(e),
            StoreError::Transaction(e) => ServiceError::Internal(e),
            StoreError::Conflict(e) => ServiceError::Unavailable(e),
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::UnknownGateway(key) => ServiceError::UnknownGateway(key),
            GatewayError::InvalidToken(msg) => ServiceError::InvalidToken(msg),
            GatewayError::Transport(msg) => ServiceError::Unavailable(msg),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InsufficientFunds {
                available,
                requested,
            } => ServiceError::InsufficientFunds {
                available,
                requested,
            },
            e => ServiceError::BadRequest(e.to_string()),
        }
    }
}
