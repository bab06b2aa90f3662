use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Registered (RFC 7519) JWT claims.
///
/// Services embed this with `#[serde(flatten)]` next to their own custom
/// claims. Subject and the validity window are always present; issuer,
/// audience and token id are optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredClaims {
    /// Subject (user/entity identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// JWT ID (unique token identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl RegisteredClaims {
    /// Create claims valid from `issued_at` for `lifetime`.
    ///
    /// # Arguments
    /// * `subject` - Subject the token is issued to
    /// * `issued_at` - Issuance instant, also used as not-before
    /// * `lifetime` - Duration until expiration
    ///
    /// # Errors
    /// * `InvalidLifetime` - Expiration falls outside the representable time range
    pub fn new(
        subject: impl ToString,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<Self, JwtError> {
        let expiration = issued_at
            .checked_add_signed(lifetime)
            .ok_or(JwtError::InvalidLifetime)?;

        Ok(Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expiration.timestamp(),
            iss: None,
            aud: None,
            jti: None,
        })
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: impl ToString) -> Self {
        self.iss = Some(iss.to_string());
        self
    }

    /// Set audience.
    pub fn with_audience(mut self, aud: impl ToString) -> Self {
        self.aud = Some(aud.to_string());
        self
    }

    /// Set token id.
    pub fn with_token_id(mut self, jti: impl ToString) -> Self {
        self.jti = Some(jti.to_string());
        self
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }

    /// Check that `current_timestamp` lies in `[nbf, exp]`.
    ///
    /// # Errors
    /// * `NotYetValid` - Current time is before `nbf`
    /// * `TokenExpired` - Current time is after `exp`
    pub fn check_window(&self, current_timestamp: i64) -> Result<(), JwtError> {
        if current_timestamp < self.nbf {
            return Err(JwtError::NotYetValid);
        }

        if self.is_expired(current_timestamp) {
            return Err(JwtError::TokenExpired);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_claims() {
        let claims = RegisteredClaims::new("alice", issued_at(), Duration::hours(24)).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert!(claims.iss.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let claims = RegisteredClaims::new("alice", issued_at(), Duration::hours(1))
            .unwrap()
            .with_issuer("cm-api")
            .with_audience("cm-web")
            .with_token_id("token-1");

        assert_eq!(claims.iss, Some("cm-api".to_string()));
        assert_eq!(claims.aud, Some("cm-web".to_string()));
        assert_eq!(claims.jti, Some("token-1".to_string()));
    }

    #[test]
    fn test_overflowing_lifetime_rejected() {
        let result = RegisteredClaims::new("alice", issued_at(), Duration::hours(2_000_000_000_000));

        assert_eq!(result, Err(JwtError::InvalidLifetime));
    }

    #[test]
    fn test_is_expired() {
        let claims = RegisteredClaims::new("alice", issued_at(), Duration::seconds(1000)).unwrap();
        let exp = claims.exp;

        assert!(!claims.is_expired(exp - 1));
        assert!(!claims.is_expired(exp)); // Exactly at expiration
        assert!(claims.is_expired(exp + 1));
    }

    #[test]
    fn test_check_window() {
        let claims = RegisteredClaims::new("alice", issued_at(), Duration::hours(1)).unwrap();

        assert!(claims.check_window(claims.iat).is_ok());
        assert!(matches!(
            claims.check_window(claims.nbf - 1),
            Err(JwtError::NotYetValid)
        ));
        assert!(matches!(
            claims.check_window(claims.exp + 1),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_serialized_field_names() {
        let claims = RegisteredClaims::new("alice", issued_at(), Duration::hours(1))
            .unwrap()
            .with_issuer("cm-api")
            .with_audience("cm-web");

        let value = serde_json::to_value(&claims).unwrap();

        for field in ["sub", "iat", "nbf", "exp", "iss", "aud"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert!(value.get("jti").is_none());
    }
}
