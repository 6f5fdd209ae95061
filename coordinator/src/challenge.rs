/// Download-authentication challenge/response (SPEC_FULL.md §4.5). The
/// coordinator proves the caller holds the private key matching a
/// previously-registered public key by encrypting a one-time nonce with
/// OAEP(MGF1-SHA256, SHA256) and requiring it back in plaintext.
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use chrono::Utc;
use dashmap::DashMap;
use rand::rngs::OsRng;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::CoordinatorError;

struct PendingChallenge {
    filename: String,
    nonce: String,
    issued_at: i64,
}

/// One outstanding challenge per username; issuing a new one for the same
/// username overwrites any previous challenge (the old nonce becomes
/// unusable), matching the reference server's `active_challenges[username]`
/// dict. The filename the challenge was issued for is bound alongside the
/// nonce so verification can't be satisfied against a different download.
pub struct ChallengeTable {
    pending: DashMap<String, PendingChallenge>,
    ttl_secs: i64,
}

impl ChallengeTable {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            pending: DashMap::new(),
            ttl_secs: ttl_secs as i64,
        }
    }

    /// Generates a fresh nonce for `username`'s download of `filename`,
    /// encrypts it with `public_key` using OAEP, and returns the
    /// base64-encoded ciphertext.
    pub fn issue(
        &self,
        username: &str,
        filename: &str,
        public_key: &RsaPublicKey,
    ) -> Result<String, CoordinatorError> {
        let nonce = Uuid::new_v4().to_string();
        let padding = Oaep::new::<Sha256>();
        let ciphertext = public_key
            .encrypt(&mut OsRng, padding, nonce.as_bytes())
            .map_err(|e| CoordinatorError::Internal(format!("OAEP encryption failed: {}", e)))?;

        self.pending.insert(
            username.to_string(),
            PendingChallenge {
                filename: filename.to_string(),
                nonce,
                issued_at: Utc::now().timestamp(),
            },
        );

        Ok(BASE64_STANDARD.encode(ciphertext))
    }

    /// Validates `response` against the outstanding nonce for `username`'s
    /// pending challenge, requiring it to have been issued for `filename`.
    /// The challenge is consumed (removed) whether it matches or not, so a
    /// nonce can never be replayed.
    pub fn verify(&self, username: &str, filename: &str, response: &str) -> Result<bool, CoordinatorError> {
        let entry = self.pending.remove(username).ok_or_else(|| {
            CoordinatorError::Unauthorized(format!("no active challenge for {}", username))
        })?;

        let (_, challenge) = entry;
        if challenge.filename != filename {
            return Err(CoordinatorError::Unauthorized(format!(
                "active challenge for {} was issued for a different file",
                username
            )));
        }
        if Utc::now().timestamp() - challenge.issued_at > self.ttl_secs {
            return Err(CoordinatorError::Unauthorized(format!(
                "challenge for {} has expired",
                username
            )));
        }

        Ok(response == challenge.nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;

    fn keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let mut rng = OsRng;
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        (private, public)
    }

    fn decrypt(private: &RsaPrivateKey, ciphertext_b64: &str) -> String {
        let ciphertext = BASE64_STANDARD.decode(ciphertext_b64).unwrap();
        let padding = Oaep::new::<Sha256>();
        let plaintext = private.decrypt(padding, &ciphertext).unwrap();
        String::from_utf8(plaintext).unwrap()
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let (private, public) = keypair();
        let table = ChallengeTable::new(30);
        let ciphertext_b64 = table.issue("alice", "file.txt", &public).unwrap();
        let nonce = decrypt(&private, &ciphertext_b64);

        assert!(table.verify("alice", "file.txt", &nonce).unwrap());
    }

    #[test]
    fn verify_is_single_use() {
        let (private, public) = keypair();
        let table = ChallengeTable::new(30);
        let ciphertext_b64 = table.issue("alice", "file.txt", &public).unwrap();
        let nonce = decrypt(&private, &ciphertext_b64);

        assert!(table.verify("alice", "file.txt", &nonce).unwrap());
        assert!(table.verify("alice", "file.txt", &nonce).is_err());
    }

    #[test]
    fn verify_without_challenge_is_unauthorized() {
        let table = ChallengeTable::new(30);
        assert!(table.verify("missing-user", "file.txt", "anything").is_err());
    }

    #[test]
    fn two_users_downloading_the_same_file_do_not_clobber_each_other() {
        let (private_a, public_a) = keypair();
        let (private_b, public_b) = keypair();
        let table = ChallengeTable::new(30);

        let cipher_a = table.issue("alice", "shared.txt", &public_a).unwrap();
        let cipher_b = table.issue("bob", "shared.txt", &public_b).unwrap();

        let nonce_a = decrypt(&private_a, &cipher_a);
        let nonce_b = decrypt(&private_b, &cipher_b);

        assert!(table.verify("bob", "shared.txt", &nonce_b).unwrap());
        assert!(table.verify("alice", "shared.txt", &nonce_a).unwrap());
    }

    #[test]
    fn verify_against_wrong_filename_is_unauthorized() {
        let (private, public) = keypair();
        let table = ChallengeTable::new(30);
        let ciphertext_b64 = table.issue("alice", "file.txt", &public).unwrap();
        let nonce = decrypt(&private, &ciphertext_b64);

        assert!(table.verify("alice", "other.txt", &nonce).is_err());
    }
}
