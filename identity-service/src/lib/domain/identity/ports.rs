use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::identity::models::AccessClaims;
use crate::domain::identity::models::Credentials;
use crate::domain::identity::models::IssuedToken;
use crate::domain::identity::models::NewUser;
use crate::domain::identity::models::NewUserRecord;
use crate::domain::identity::models::Password;
use crate::domain::identity::models::PasswordHash;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::UserId;
use crate::domain::identity::models::UserRecord;
use crate::identity::errors::AuthError;
use crate::identity::errors::HashingError;
use crate::identity::errors::StoreError;
use crate::identity::errors::TokenError;

/// Port for registration and login.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `new_user` - Username, email and plaintext password
    ///
    /// # Returns
    /// Identifier generated by the store
    ///
    /// # Errors
    /// * `MissingFields` - Username, email or password is empty
    /// * `Conflict` - Username or email is already registered
    /// * `HashingFailure` - Password could not be hashed
    /// * `PersistenceFailure` - Store lookup or insert failed
    async fn register(&self, new_user: NewUser) -> Result<UserId, AuthError>;

    /// Verify credentials and issue an access token.
    ///
    /// # Arguments
    /// * `credentials` - Username and plaintext password
    ///
    /// # Returns
    /// Signed access token
    ///
    /// # Errors
    /// * `MissingFields` - Username or password is empty
    /// * `InvalidCredentials` - Unknown username or wrong password (indistinguishable)
    /// * `HashingFailure` - Password verification could not run
    /// * `PersistenceFailure` - Store lookup failed
    /// * `TokenIssuanceFailure` - Token could not be signed
    async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AuthError>;

    /// Password reset placeholder.
    ///
    /// Not implemented: always succeeds without changing anything.
    async fn reset_password(&self) -> Result<(), AuthError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this identifier
    /// * `PersistenceFailure` - Store lookup failed
    async fn get_user(&self, id: &UserId) -> Result<UserRecord, AuthError>;

    /// Validate an access token and return its claims.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature, issuer, audience or validity window check failed
    fn validate_token(&self, token: &str) -> Result<AccessClaims, AuthError>;
}

/// Persistence operations for user records.
///
/// Lookups return `StoreError::NotFound` when nothing matches.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Retrieve user by username.
    ///
    /// # Errors
    /// * `NotFound` - No user with this username
    /// * `Timeout` / `Unavailable` - Store could not answer
    async fn find_by_username(&self, username: &str) -> Result<UserRecord, StoreError>;

    /// Retrieve user by email address.
    ///
    /// # Errors
    /// * `NotFound` - No user with this email
    /// * `Timeout` / `Unavailable` - Store could not answer
    async fn find_by_email(&self, email: &str) -> Result<UserRecord, StoreError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `NotFound` - No user with this identifier
    /// * `Timeout` / `Unavailable` - Store could not answer
    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, StoreError>;

    /// Persist a new user.
    ///
    /// Uniqueness of username and email is enforced atomically here; callers'
    /// pre-checks are only an optimization.
    ///
    /// # Returns
    /// Generated identifier
    ///
    /// # Errors
    /// * `Conflict` - Username or email already exists
    /// * `Timeout` / `Unavailable` - Store could not answer
    async fn insert(&self, user: NewUserRecord) -> Result<UserId, StoreError>;
}

/// Slow, salted one-way password hashing.
pub trait CredentialHasher: Send + Sync + 'static {
    /// Hash a plaintext password with a fresh random salt.
    fn hash(&self, plaintext: &Password) -> Result<PasswordHash, HashingError>;

    /// Constant-time check of `plaintext` against `hash`.
    ///
    /// Mismatch and malformed hash both return `false`.
    fn verify(&self, hash: &PasswordHash, plaintext: &Password) -> bool;

    /// Spend the cost of one verification without a stored hash.
    fn verify_decoy(&self, plaintext: &Password);
}

/// Signed, claims-bearing token construction and validation.
pub trait TokenIssuer: Send + Sync + 'static {
    /// Issue a token for `subject` valid from now for `expiry`.
    ///
    /// # Errors
    /// * `SigningFailed` - Signing key is invalid or encoding failed
    fn issue(&self, subject: &str, roles: &[Role], expiry: Duration)
        -> Result<IssuedToken, TokenError>;

    /// Verify signature, issuer, audience and validity window.
    ///
    /// # Errors
    /// * `Expired` / `NotYetValid` - Current time outside `[nbf, exp]`
    /// * `BadSignature` - Signed with a different key
    /// * `Malformed` - Not a token, or claims missing or mismatched
    fn validate(&self, token: &str) -> Result<AccessClaims, TokenError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}
