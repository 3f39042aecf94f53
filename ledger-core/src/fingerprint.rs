//! Derived idempotency keys.
//!
//! When a caller supplies no explicit request key but names the business
//! cause of a payment (a listing, a chat), the key is derived from the
//! triple (sender, recipient, reference). Retries of the same cause then
//! collapse onto one ledger row without the caller managing keys.

use sha2::{Digest, Sha256};

use ledger_types::OwnerId;

/// Derives a deterministic request key from the payment's natural identity.
pub fn derive_request_key(sender: OwnerId, recipient: OwnerId, reference: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sender.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(recipient.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(reference.as_bytes());
    hex::encode(hasher.finalize())
}
