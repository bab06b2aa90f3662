use auth::JwtError;
use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid user id: {0}")]
    InvalidFormat(String),
}

/// Error reported by a user store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,

    /// Uniqueness constraint violated; carries the offending field or constraint name.
    #[error("Uniqueness constraint violated: {0}")]
    Conflict(String),

    #[error("User store timed out")]
    Timeout,

    #[error("User store unavailable: {0}")]
    Unavailable(String),
}

/// Error for password hashing operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Password hashing failed: {0}")]
pub struct HashingError(pub String);

/// Error for token signing and validation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    SigningFailed(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token is not valid yet")]
    NotYetValid,

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token is malformed: {0}")]
    Malformed(String),
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingKey | JwtError::InvalidLifetime => {
                TokenError::SigningFailed(err.to_string())
            }
            JwtError::EncodingFailed(msg) => TokenError::SigningFailed(msg),
            JwtError::InvalidSignature => TokenError::BadSignature,
            JwtError::TokenExpired => TokenError::Expired,
            JwtError::NotYetValid => TokenError::NotYetValid,
            JwtError::Malformed(msg) => TokenError::Malformed(msg),
        }
    }
}

/// Outcome of a rejected registration, login or lookup.
///
/// Infrastructure variants carry no detail; the cause is logged where the
/// failure happens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("username, email and password are required")]
    MissingFields,

    #[error("user already exists")]
    Conflict,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid token: {0}")]
    InvalidToken(TokenError),

    #[error("failed to process password")]
    HashingFailure,

    #[error("failed to access user store")]
    PersistenceFailure,

    #[error("failed to generate token")]
    TokenIssuanceFailure,
}
