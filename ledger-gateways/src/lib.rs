//! # Ledger Gateways
//!
//! Outbound adapters wrapping external payment providers behind the
//! `PaymentGateway` capability trait, plus the registration-table factory
//! that resolves a provider key to an adapter.
//!
//! Adapters share one normalization discipline: an HTTP response from the
//! provider - success or rejection - is a business outcome and becomes a
//! `PaymentResult`; only a failure to reach the provider at all becomes
//! `GatewayError::Transport`.

pub mod config;
pub mod factory;
pub mod mock;
pub mod paypal;
pub mod stripe;

pub use config::GatewaysConfig;
pub use factory::GatewayFactory;
pub use mock::{MockBehavior, MockGateway};
pub use paypal::PayPalGateway;
pub use stripe::StripeGateway;
