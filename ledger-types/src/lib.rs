//! # Ledger Types
//!
//! Domain types and port traits for the payment & wallet ledger engine.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Money, Wallet, Transaction, UserCard)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for the service boundary
//! - `error/` - Domain, store, gateway and service error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    BillingFrequency, CardId, CardPurpose, Currency, Money, NotificationEvent, NotificationStatus,
    OwnerId, PaymentResult, PaymentResultStatus, Subscription, SubscriptionId, TokenizedCard,
    Transaction, TransactionId, TransactionStatus, TransferKind, UserCard, Wallet,
};
pub use dto::*;
pub use error::{DomainError, GatewayError, ServiceError, StoreError};
pub use ports::{
    CardStore, CardTokenizer, LedgerStore, PaymentGateway, SubscriptionRecord, TransferRecord,
};
