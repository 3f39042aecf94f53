//! Port traits of the hexagonal architecture.
//!
//! Adapters (SQLite, Postgres, provider gateways, in-memory test doubles)
//! implement these traits; the service layer is generic over them.

pub mod cards;
pub mod gateway;
pub mod ledger;

pub use cards::CardStore;
pub use gateway::{CardTokenizer, PaymentGateway};
pub use ledger::{LedgerStore, SubscriptionRecord, TransferRecord};
