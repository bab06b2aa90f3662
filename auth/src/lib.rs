//! Authentication utilities library
//!
//! Provides reusable credential primitives:
//! - Password hashing (Argon2id) with a configurable work factor
//! - JWT token encoding and validation (HS256)
//!
//! Services define their own authentication traits and adapt these implementations.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::{PasswordHasher, WorkFactor};
//!
//! let hasher = PasswordHasher::new(WorkFactor::default()).unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::{JwtHandler, RegisteredClaims};
//! use chrono::{Duration, Utc};
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let claims = RegisteredClaims::new("alice", Utc::now(), Duration::hours(1))
//!     .unwrap()
//!     .with_issuer("cm-api")
//!     .with_audience("cm-web");
//! let token = handler.encode(&claims).unwrap();
//! let decoded: RegisteredClaims = handler.decode(&token, "cm-api", "cm-web").unwrap();
//! assert!(decoded.check_window(Utc::now().timestamp()).is_ok());
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::RegisteredClaims;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::WorkFactor;
