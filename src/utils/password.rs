//! Password hashing seam for protected links.
//!
//! The redemption validator only needs "does this plaintext match this stored
//! hash"; the trait keeps that decision mockable while the production
//! implementation hashes with HMAC-SHA256 keyed by a server-side pepper, so a
//! database leak alone is not enough to recover or forge link passwords.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compares a supplied plaintext password against a stored hash.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordVerifier: Send + Sync {
    /// Returns `true` when `supplied` hashes to `stored_hash`.
    fn verify(&self, supplied: &str, stored_hash: &str) -> bool;
}

/// HMAC-SHA256 password hasher/verifier keyed by a server-side pepper.
pub struct HmacPasswordVerifier {
    pepper: String,
}

impl HmacPasswordVerifier {
    pub fn new(pepper: String) -> Self {
        Self { pepper }
    }

    /// Hashes a plaintext password into the stored representation.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    pub fn hash(&self, plaintext: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.pepper.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl PasswordVerifier for HmacPasswordVerifier {
    fn verify(&self, supplied: &str, stored_hash: &str) -> bool {
        let Ok(expected) = hex::decode(stored_hash) else {
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(self.pepper.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(supplied.as_bytes());

        // Constant-time comparison.
        mac.verify_slice(&expected).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trips() {
        let verifier = HmacPasswordVerifier::new("pepper".to_string());
        let hash = verifier.hash("hunter2");

        assert!(verifier.verify("hunter2", &hash));
        assert!(!verifier.verify("hunter3", &hash));
    }

    #[test]
    fn test_hash_is_hex_encoded() {
        let verifier = HmacPasswordVerifier::new("pepper".to_string());
        let hash = verifier.hash("secret");

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_peppers_produce_different_hashes() {
        let a = HmacPasswordVerifier::new("pepper-a".to_string());
        let b = HmacPasswordVerifier::new("pepper-b".to_string());

        assert_ne!(a.hash("secret"), b.hash("secret"));
        assert!(!b.verify("secret", &a.hash("secret")));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let verifier = HmacPasswordVerifier::new("pepper".to_string());
        assert!(!verifier.verify("secret", "not-hex"));
        assert!(!verifier.verify("secret", ""));
    }
}
