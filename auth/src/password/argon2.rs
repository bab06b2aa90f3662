use std::hint::black_box;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Argon2 cost parameters applied to every new hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkFactor {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes over memory
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password hashing implementation.
///
/// Hashes with Argon2id and a random salt per call. Verification runs
/// through the `password-hash` verifier, which compares digests in
/// constant time and reads cost parameters from the stored PHC string, so
/// hashes produced under an older work factor keep verifying.
pub struct PasswordHasher {
    params: Params,
    work_factor: WorkFactor,
    decoy_hash: String,
}

impl PasswordHasher {
    /// Create a new password hasher with a fixed work factor.
    ///
    /// Also computes the decoy hash used by [`PasswordHasher::verify_decoy`].
    ///
    /// # Arguments
    /// * `work_factor` - Argon2 memory, iteration and parallelism costs
    ///
    /// # Errors
    /// * `InvalidWorkFactor` - Parameters outside Argon2 bounds
    /// * `HashingFailed` - Decoy hash could not be computed
    pub fn new(work_factor: WorkFactor) -> Result<Self, PasswordError> {
        let params = Params::new(
            work_factor.memory_kib,
            work_factor.iterations,
            work_factor.parallelism,
            None,
        )
        .map_err(|e| PasswordError::InvalidWorkFactor(e.to_string()))?;

        let mut hasher = Self {
            params,
            work_factor,
            decoy_hash: String::new(),
        };

        let decoy_secret = SaltString::generate(&mut OsRng);
        hasher.decoy_hash = hasher.hash(decoy_secret.as_str())?;

        Ok(hasher)
    }

    /// Work factor applied to new hashes.
    pub fn work_factor(&self) -> WorkFactor {
        self.work_factor
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password securely.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// A malformed hash and a wrong password both yield `false`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed_hash) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Spend the cost of a real verification without a stored hash.
    ///
    /// Used when the account does not exist so the caller's response time
    /// does not reveal it.
    ///
    /// The decoy is hashed under the current work factor. Stored hashes
    /// created under an older factor verify at their own cost, so the
    /// timing match is approximate until those accounts are rehashed.
    pub fn verify_decoy(&self, password: &str) {
        black_box(self.verify(password, &self.decoy_hash));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(WorkFactor {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to build hasher")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "my_secure_password";

        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast_hasher();

        let first = hasher.hash("secret123").expect("Failed to hash password");
        let second = hasher.hash("secret123").expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(hasher.verify("secret123", &first));
        assert!(hasher.verify("secret123", &second));
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let hasher = fast_hasher();
        let hash = hasher.hash("plaintext-marker").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("plaintext-marker"));
    }

    #[test]
    fn test_work_factor_is_encoded_in_hash() {
        let hasher = fast_hasher();
        let hash = hasher.hash("password").expect("Failed to hash password");

        assert!(hash.contains("m=1024,t=1,p=1"));
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = fast_hasher();

        assert!(!hasher.verify("password", "invalid_hash"));
        assert!(!hasher.verify("password", ""));
    }

    #[test]
    fn test_verify_hash_from_other_work_factor() {
        let old = fast_hasher();
        let hash = old.hash("password").expect("Failed to hash password");

        let new = PasswordHasher::new(WorkFactor {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .expect("Failed to build hasher");

        assert!(new.verify("password", &hash));
    }

    #[test]
    fn test_work_factor_is_reported() {
        let hasher = fast_hasher();

        assert_eq!(
            hasher.work_factor(),
            WorkFactor {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            }
        );
    }

    #[test]
    fn test_invalid_work_factor() {
        let result = PasswordHasher::new(WorkFactor {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        });

        assert!(matches!(result, Err(PasswordError::InvalidWorkFactor(_))));
    }

    #[test]
    fn test_default_work_factor() {
        let work_factor = WorkFactor::default();

        assert_eq!(work_factor.memory_kib, 19 * 1024);
        assert_eq!(work_factor.iterations, 2);
        assert_eq!(work_factor.parallelism, 1);
    }
}
