//! HMAC signing for outbound notifications.
//!
//! Receivers verify the hex-encoded HMAC-SHA256 of the raw request body
//! against the shared secret before trusting a notification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Signs a notification payload, returning the hex-encoded signature.
pub fn sign_notification(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a hex-encoded signature against the payload in constant time.
pub fn verify_notification_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let expected = sign_notification(secret, payload);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let payload = br#"{"transaction_id":"abc","amount":5000}"#;
        let sig = sign_notification("topsecret", payload);
        assert!(verify_notification_signature("topsecret", payload, &sig));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"payload";
        let sig = sign_notification("secret-a", payload);
        assert!(!verify_notification_signature("secret-b", payload, &sig));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sig = sign_notification("secret", b"original");
        assert!(!verify_notification_signature("secret", b"tampered", &sig));
    }

    #[test]
    fn test_signature_is_deterministic_hex() {
        let sig = sign_notification("secret", b"body");
        assert_eq!(sig, sign_notification("secret", b"body"));
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
