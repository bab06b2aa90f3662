use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::identity::models::AccessClaims;
use crate::domain::identity::models::Credentials;
use crate::domain::identity::models::IssuedToken;
use crate::domain::identity::models::NewUser;
use crate::domain::identity::models::NewUserRecord;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::UserId;
use crate::domain::identity::models::UserRecord;
use crate::identity::errors::AuthError;
use crate::identity::errors::HashingError;
use crate::identity::errors::StoreError;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::Clock;
use crate::identity::ports::CredentialHasher;
use crate::identity::ports::TokenIssuer;
use crate::identity::ports::UserRepository;

/// Immutable settings applied to every request.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    /// Roles granted to every issued token
    pub default_roles: Vec<Role>,
    /// Access token lifetime
    pub token_lifetime: chrono::Duration,
    /// Upper bound for a single store call
    pub store_timeout: std::time::Duration,
    /// Upper bound for a single hash or verify
    pub hashing_timeout: std::time::Duration,
}

/// Registration and login orchestrator.
///
/// Concrete implementation of AuthServicePort with dependency injection.
/// Holds no mutable state; every collaborator is shared read-only.
pub struct AuthService<UR, CH, TI>
where
    UR: UserRepository,
    CH: CredentialHasher,
    TI: TokenIssuer,
{
    repository: Arc<UR>,
    hasher: Arc<CH>,
    issuer: Arc<TI>,
    clock: Arc<dyn Clock>,
    policy: AuthPolicy,
}

impl<UR, CH, TI> AuthService<UR, CH, TI>
where
    UR: UserRepository,
    CH: CredentialHasher,
    TI: TokenIssuer,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User store implementation
    /// * `hasher` - Password hashing implementation
    /// * `issuer` - Token signing implementation
    /// * `clock` - Time source for record timestamps
    /// * `policy` - Roles, token lifetime and timeouts
    pub fn new(
        repository: Arc<UR>,
        hasher: Arc<CH>,
        issuer: Arc<TI>,
        clock: Arc<dyn Clock>,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            repository,
            hasher,
            issuer,
            clock,
            policy,
        }
    }

    async fn store<F, V>(&self, call: F) -> Result<V, StoreError>
    where
        F: Future<Output = Result<V, StoreError>>,
    {
        tokio::time::timeout(self.policy.store_timeout, call)
            .await
            .unwrap_or(Err(StoreError::Timeout))
    }

    /// Run a hasher job on the blocking pool, bounded by the hashing timeout.
    async fn run_hasher<F, V>(&self, operation: &'static str, job: F) -> Result<V, AuthError>
    where
        F: FnOnce(&CH) -> Result<V, HashingError> + Send + 'static,
        V: Send + 'static,
    {
        let hasher = Arc::clone(&self.hasher);
        let task = tokio::task::spawn_blocking(move || job(hasher.as_ref()));

        match tokio::time::timeout(self.policy.hashing_timeout, task).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => {
                tracing::error!(operation, error = %e, "Password hashing failed");
                Err(AuthError::HashingFailure)
            }
            Ok(Err(e)) => {
                tracing::error!(operation, error = %e, "Password hashing task aborted");
                Err(AuthError::HashingFailure)
            }
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.policy.hashing_timeout.as_millis(),
                    "Password hashing timed out"
                );
                Err(AuthError::HashingFailure)
            }
        }
    }

    /// Reject registration if username or email is taken (username first).
    ///
    /// Only a pre-check: a concurrent registration can still win the race,
    /// in which case the store's constraint reports the conflict on insert.
    async fn ensure_available(&self, username: &str, email: &str) -> Result<(), AuthError> {
        match self.store(self.repository.find_by_username(username)).await {
            Ok(_) => {
                tracing::info!(username, "Registration rejected: username taken");
                return Err(AuthError::Conflict);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => {
                tracing::error!(error = %e, "Username lookup failed");
                return Err(AuthError::PersistenceFailure);
            }
        }

        match self.store(self.repository.find_by_email(email)).await {
            Ok(_) => {
                tracing::info!(username, "Registration rejected: email taken");
                Err(AuthError::Conflict)
            }
            Err(StoreError::NotFound) => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, "Email lookup failed");
                Err(AuthError::PersistenceFailure)
            }
        }
    }
}

#[async_trait]
impl<UR, CH, TI> AuthServicePort for AuthService<UR, CH, TI>
where
    UR: UserRepository,
    CH: CredentialHasher,
    TI: TokenIssuer,
{
    async fn register(&self, new_user: NewUser) -> Result<UserId, AuthError> {
        let NewUser {
            username,
            email,
            password,
        } = new_user;

        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        self.ensure_available(&username, &email).await?;

        let password_hash = self
            .run_hasher("hash", move |hasher| hasher.hash(&password))
            .await?;

        let now = self.clock.now();
        let record = NewUserRecord {
            username,
            email,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        match self.store(self.repository.insert(record)).await {
            Ok(user_id) => {
                tracing::info!(user_id = %user_id, "User registered");
                Ok(user_id)
            }
            Err(StoreError::Conflict(constraint)) => {
                tracing::info!(constraint = %constraint, "Registration rejected by store constraint");
                Err(AuthError::Conflict)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist user");
                Err(AuthError::PersistenceFailure)
            }
        }
    }

    async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AuthError> {
        let Credentials { username, password } = credentials;

        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let user = match self.store(self.repository.find_by_username(&username)).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                self.run_hasher("verify", move |hasher| {
                    hasher.verify_decoy(&password);
                    Ok(())
                })
                .await?;

                tracing::debug!(username = %username, "Login rejected: unknown user");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                tracing::error!(error = %e, "Username lookup failed");
                return Err(AuthError::PersistenceFailure);
            }
        };

        let stored_hash = user.password_hash.clone();
        let is_valid = self
            .run_hasher("verify", move |hasher| {
                Ok(hasher.verify(&stored_hash, &password))
            })
            .await?;

        if !is_valid || !user.is_active {
            tracing::debug!(user_id = %user.id, "Login rejected: bad password or inactive user");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .issuer
            .issue(
                &user.username,
                &self.policy.default_roles,
                self.policy.token_lifetime,
            )
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Token issuance failed");
                AuthError::TokenIssuanceFailure
            })?;

        tracing::info!(user_id = %user.id, expires_at = %token.expires_at, "User logged in");

        Ok(token)
    }

    async fn reset_password(&self) -> Result<(), AuthError> {
        // Placeholder: no reset flow exists, nothing is changed.
        tracing::debug!("Password reset requested; not implemented");
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<UserRecord, AuthError> {
        match self.store(self.repository.find_by_id(id)).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound) => Err(AuthError::UserNotFound),
            Err(e) => {
                tracing::error!(user_id = %id, error = %e, "User lookup failed");
                Err(AuthError::PersistenceFailure)
            }
        }
    }

    fn validate_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.issuer.validate(token).map_err(AuthError::InvalidToken)
    }
}
