//! Core services of the payment & wallet ledger engine.
//!
//! [`PaymentService`] orchestrates gateway calls and atomic ledger writes;
//! [`CardVault`] manages tokenized instruments. Both are generic over the
//! store ports so adapters are injected at compile time.

pub mod fingerprint;
pub mod service;
pub mod vault;

pub use service::{ChargeReceipt, PaymentService};
pub use vault::CardVault;

#[cfg(test)]
mod service_tests;
