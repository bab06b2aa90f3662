use auth::PasswordHasher;

use crate::identity::errors::HashingError;
use crate::identity::models::Password;
use crate::identity::models::PasswordHash;
use crate::identity::ports::CredentialHasher;

/// Argon2id hashing backed by the auth library.
impl CredentialHasher for PasswordHasher {
    fn hash(&self, plaintext: &Password) -> Result<PasswordHash, HashingError> {
        PasswordHasher::hash(self, plaintext.expose())
            .map(PasswordHash::new)
            .map_err(|e| HashingError(e.to_string()))
    }

    fn verify(&self, hash: &PasswordHash, plaintext: &Password) -> bool {
        PasswordHasher::verify(self, plaintext.expose(), hash.as_str())
    }

    fn verify_decoy(&self, plaintext: &Password) {
        PasswordHasher::verify_decoy(self, plaintext.expose())
    }
}

#[cfg(test)]
mod tests {
    use auth::WorkFactor;

    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(WorkFactor {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to build hasher")
    }

    fn port(hasher: &PasswordHasher) -> &dyn CredentialHasher {
        hasher
    }

    #[test]
    fn test_verify_round_trip_through_port() {
        let hasher = hasher();
        let port = port(&hasher);

        for plaintext in ["secret123", "p", "pässwörd with spaces", "🔑🔑"] {
            let password = Password::new(plaintext);
            let hash = port.hash(&password).expect("Failed to hash password");

            assert!(port.verify(&hash, &password));
            assert!(!port.verify(&hash, &Password::new(format!("{plaintext}x"))));
        }
    }

    #[test]
    fn test_hashing_is_not_deterministic() {
        let hasher = hasher();
        let port = port(&hasher);
        let password = Password::new("secret123");

        let first = port.hash(&password).expect("Failed to hash password");
        let second = port.hash(&password).expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(port.verify(&first, &password));
        assert!(port.verify(&second, &password));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        let hasher = hasher();
        let port = port(&hasher);

        assert!(!port.verify(&PasswordHash::new("secret123"), &Password::new("secret123")));
    }
}
