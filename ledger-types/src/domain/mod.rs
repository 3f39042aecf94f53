//! Domain models for the payment & wallet ledger engine.

pub mod card;
pub mod money;
pub mod notification;
pub mod owner;
pub mod payment;
pub mod subscription;
pub mod transaction;
pub mod wallet;

pub use card::{CardId, CardPurpose, TokenizedCard, UserCard};
pub use money::{Currency, Money};
pub use notification::{NotificationEvent, NotificationStatus};
pub use owner::OwnerId;
pub use payment::{PaymentResult, PaymentResultStatus};
pub use subscription::{BillingFrequency, Subscription, SubscriptionId};
pub use transaction::{Transaction, TransactionId, TransactionStatus, TransferKind};
pub use wallet::Wallet;
