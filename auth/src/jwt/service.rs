use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::claims::Claims;
use super::errors::JwtError;
use super::handler::JwtHandler;
use crate::clock::Clock;
use crate::clock::SystemClock;

/// Issues and validates time-bounded identity tokens.
///
/// Stateless: a token is accepted iff its signature verifies against the
/// configured secret, it carries `sub` and `exp`, and the clock reads
/// strictly before `exp`. There is no revocation before expiry.
pub struct TokenService {
    handler: JwtHandler,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of validating a presented token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValidation {
    Valid(Claims),
    Invalid,
}

impl TokenValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenValidation::Valid(_))
    }

    /// Subject of a valid token.
    pub fn subject(&self) -> Option<&str> {
        match self {
            TokenValidation::Valid(claims) => claims.sub.as_deref(),
            TokenValidation::Invalid => None,
        }
    }
}

impl TokenService {
    /// Create a token service backed by the system clock.
    ///
    /// # Arguments
    /// * `secret` - HMAC signing secret
    /// * `ttl` - Lifetime of issued tokens
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            handler: JwtHandler::new(secret),
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `subject`, valid from now for the configured TTL.
    ///
    /// # Errors
    /// * `SigningFailed` - Claims could not be serialized or signed
    pub fn issue(&self, subject: &str, username: &str) -> Result<IssuedToken, JwtError> {
        let claims = Claims::for_identity(subject, username, self.clock.now(), self.ttl);
        let token = self.handler.encode(&claims)?;
        let expires_at = claims
            .exp
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
            .ok_or_else(|| JwtError::SigningFailed("expiry out of range".to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token, reporting only whether it is acceptable.
    ///
    /// Never fails: every rejection collapses into `Invalid`.
    pub fn validate(&self, token: &str) -> TokenValidation {
        match self.verify(token) {
            Ok(claims) => TokenValidation::Valid(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                TokenValidation::Invalid
            }
        }
    }

    /// Validate a token and report why it was rejected.
    ///
    /// # Errors
    /// * `Rejected` - Malformed token or signature mismatch
    /// * `MissingClaim` - `sub` or `exp` absent
    /// * `Expired` - Current time is at or past `exp`
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let claims: Claims = self.handler.decode(token)?;

        if claims.sub.as_deref().map_or(true, str::is_empty) {
            return Err(JwtError::MissingClaim("sub"));
        }
        if claims.exp.is_none() {
            return Err(JwtError::MissingClaim("exp"));
        }
        if claims.is_expired(self.clock.now()) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";
    const T0: i64 = 1_700_000_000;

    fn service_at(clock: &Arc<ManualClock>, ttl: Duration) -> TokenService {
        TokenService::new(SECRET, ttl).with_clock(clock.clone())
    }

    #[test]
    fn test_issue_then_validate_round_trip() {
        let clock = Arc::new(ManualClock::new(T0));
        let service = service_at(&clock, Duration::hours(1));

        let issued = service.issue("subject-1", "alice").expect("Failed to issue");
        let validation = service.validate(&issued.token);

        assert!(validation.is_valid());
        assert_eq!(validation.subject(), Some("subject-1"));
        assert_eq!(issued.expires_at.timestamp(), T0 + 3600);
    }

    #[test]
    fn test_expiry_boundary() {
        let clock = Arc::new(ManualClock::new(T0));
        let ttl = Duration::seconds(600);
        let service = service_at(&clock, ttl);

        let issued = service.issue("subject-1", "alice").expect("Failed to issue");

        clock.set(T0 + 600 - 1);
        assert!(service.validate(&issued.token).is_valid());

        clock.set(T0 + 600);
        assert_eq!(service.validate(&issued.token), TokenValidation::Invalid);
        assert_eq!(service.verify(&issued.token), Err(JwtError::Expired));
    }

    #[test]
    fn test_other_secret_always_invalid() {
        let clock = Arc::new(ManualClock::new(T0));
        let issuer = TokenService::new(b"another_secret_key_at_least_32_bytes", Duration::days(365))
            .with_clock(clock.clone());
        let validator = service_at(&clock, Duration::days(365));

        let issued = issuer.issue("subject-1", "alice").expect("Failed to issue");

        assert_eq!(validator.validate(&issued.token), TokenValidation::Invalid);
    }

    #[test]
    fn test_garbage_is_invalid() {
        let clock = Arc::new(ManualClock::new(T0));
        let service = service_at(&clock, Duration::hours(1));

        for token in ["", "garbage", "a.b.c", "invalid.token.here"] {
            assert_eq!(service.validate(token), TokenValidation::Invalid);
        }
    }

    #[test]
    fn test_missing_claims_rejected() {
        let clock = Arc::new(ManualClock::new(T0));
        let service = service_at(&clock, Duration::hours(1));
        let handler = JwtHandler::new(SECRET);

        let no_subject = handler
            .encode(&Claims::new().with_expiration(T0 + 60))
            .expect("Failed to encode");
        assert_eq!(
            service.verify(&no_subject),
            Err(JwtError::MissingClaim("sub"))
        );

        let no_expiry = handler
            .encode(&Claims::new().with_subject("subject-1"))
            .expect("Failed to encode");
        assert_eq!(
            service.verify(&no_expiry),
            Err(JwtError::MissingClaim("exp"))
        );
    }

    #[test]
    fn test_ttl_accessor() {
        let service = TokenService::new(SECRET, Duration::minutes(5));
        assert_eq!(service.ttl(), Duration::minutes(5));
    }
}
