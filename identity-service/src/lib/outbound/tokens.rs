use std::sync::Arc;

use auth::JwtHandler;
use auth::RegisteredClaims;
use chrono::DateTime;
use chrono::Duration;
use uuid::Uuid;

use crate::identity::errors::TokenError;
use crate::identity::models::AccessClaims;
use crate::identity::models::IssuedToken;
use crate::identity::models::Role;
use crate::identity::ports::Clock;
use crate::identity::ports::TokenIssuer;
use crate::outbound::clock::SystemClock;

/// HS256 access token issuer.
///
/// The signing secret is held only inside the JWT handler's keys and is
/// never exposed again after construction.
pub struct JwtTokenIssuer {
    handler: JwtHandler,
    issuer: String,
    audience: String,
    clock: Arc<dyn Clock>,
}

impl JwtTokenIssuer {
    /// Create an issuer using the system clock.
    ///
    /// # Errors
    /// * `SigningFailed` - Secret is empty
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, TokenError> {
        Self::with_clock(secret, issuer, audience, Arc::new(SystemClock))
    }

    /// Create an issuer reading time from `clock`.
    pub fn with_clock(
        secret: &[u8],
        issuer: impl Into<String>,
        audience: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            handler: JwtHandler::new(secret)?,
            issuer: issuer.into(),
            audience: audience.into(),
            clock,
        })
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(
        &self,
        subject: &str,
        roles: &[Role],
        expiry: Duration,
    ) -> Result<IssuedToken, TokenError> {
        if expiry <= Duration::zero() {
            return Err(TokenError::SigningFailed(
                "token lifetime must be positive".to_string(),
            ));
        }

        let now = self.clock.now();

        let claims = AccessClaims {
            roles: roles.to_vec(),
            registered: RegisteredClaims::new(subject, now, expiry)?
                .with_issuer(&self.issuer)
                .with_audience(&self.audience)
                .with_token_id(Uuid::new_v4()),
        };

        let expires_at = DateTime::from_timestamp(claims.registered.exp, 0).ok_or_else(|| {
            TokenError::SigningFailed("token lifetime is out of range".to_string())
        })?;
        let access_token = self.handler.encode(&claims)?;

        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }

    fn validate(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.handler.decode(token, &self.issuer, &self.audience)?;

        claims
            .registered
            .check_window(self.clock.now().timestamp())?;

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::outbound::clock::testing::ManualClock;

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

    fn issuer_with_clock() -> (JwtTokenIssuer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        ));
        let issuer = JwtTokenIssuer::with_clock(SECRET, "cm-api", "cm-web", clock.clone())
            .expect("Failed to build issuer");
        (issuer, clock)
    }

    #[test]
    fn test_issue_sets_claims() {
        let (issuer, clock) = issuer_with_clock();
        let now = clock.now();

        let token = issuer
            .issue("alice", &[Role::Admin, Role::User], Duration::hours(1))
            .expect("Failed to issue token");
        let claims = issuer
            .validate(&token.access_token)
            .expect("Failed to validate token");

        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.roles, vec![Role::Admin, Role::User]);
        assert_eq!(claims.registered.iss.as_deref(), Some("cm-api"));
        assert_eq!(claims.registered.aud.as_deref(), Some("cm-web"));
        assert_eq!(claims.registered.iat, now.timestamp());
        assert_eq!(claims.registered.nbf, now.timestamp());
        assert_eq!(claims.registered.exp, now.timestamp() + 3600);
        assert_eq!(token.expires_at, now + Duration::hours(1));
    }

    #[test]
    fn test_token_expires_after_lifetime() {
        let (issuer, clock) = issuer_with_clock();

        let token = issuer
            .issue("alice", &[Role::User], Duration::hours(1))
            .expect("Failed to issue token");
        assert!(issuer.validate(&token.access_token).is_ok());

        clock.advance(Duration::hours(1));
        assert!(issuer.validate(&token.access_token).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(
            issuer.validate(&token.access_token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_token_not_valid_before_issuance() {
        let (issuer, clock) = issuer_with_clock();

        let token = issuer
            .issue("alice", &[Role::User], Duration::hours(1))
            .expect("Failed to issue token");

        clock.advance(Duration::seconds(-1));
        assert_eq!(
            issuer.validate(&token.access_token),
            Err(TokenError::NotYetValid)
        );
    }

    #[test]
    fn test_tokens_are_never_reused() {
        let (issuer, clock) = issuer_with_clock();

        let first = issuer
            .issue("alice", &[Role::User], Duration::hours(1))
            .expect("Failed to issue token");
        let same_instant = issuer
            .issue("alice", &[Role::User], Duration::hours(1))
            .expect("Failed to issue token");
        clock.advance(Duration::seconds(5));
        let later = issuer
            .issue("alice", &[Role::User], Duration::hours(1))
            .expect("Failed to issue token");

        assert_ne!(first.access_token, same_instant.access_token);
        assert_ne!(first.access_token, later.access_token);
        assert!(later.expires_at > first.expires_at);

        let first_claims = issuer.validate(&first.access_token).unwrap();
        let later_claims = issuer.validate(&later.access_token).unwrap();
        assert_ne!(first_claims.registered.iat, later_claims.registered.iat);
    }

    #[test]
    fn test_validate_rejects_foreign_signature() {
        let (issuer, _) = issuer_with_clock();
        let other = JwtTokenIssuer::new(b"another-secret-key", "cm-api", "cm-web").unwrap();

        let token = other
            .issue("alice", &[Role::Admin], Duration::hours(1))
            .expect("Failed to issue token");

        assert_eq!(
            issuer.validate(&token.access_token),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let (issuer, _) = issuer_with_clock();

        assert!(matches!(
            issuer.validate("not-a-token"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_oversized_lifetime_fails_without_panicking() {
        let (issuer, _) = issuer_with_clock();

        let result = issuer.issue("alice", &[Role::User], Duration::hours(2_000_000_000_000));

        assert!(matches!(result, Err(TokenError::SigningFailed(_))));
    }

    #[test]
    fn test_non_positive_lifetime_rejected() {
        let (issuer, _) = issuer_with_clock();

        for lifetime in [Duration::zero(), Duration::hours(-1)] {
            assert!(matches!(
                issuer.issue("alice", &[Role::User], lifetime),
                Err(TokenError::SigningFailed(_))
            ));
        }
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        assert!(matches!(
            JwtTokenIssuer::new(b"", "cm-api", "cm-web"),
            Err(TokenError::SigningFailed(_))
        ));
    }
}
