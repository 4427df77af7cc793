use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by an identity token.
///
/// `sub`, `iat` and `exp` follow RFC 7519. They are optional here so that a
/// token missing one of them still decodes and can be rejected with a
/// precise reason instead of a generic parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (identity identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Username at issuance time, informational only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Claims {
    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims for an identity, valid from `issued_at` for `ttl`.
    ///
    /// # Arguments
    /// * `subject` - Identity identifier
    /// * `username` - Username recorded alongside the subject
    /// * `issued_at` - Unix timestamp of issuance
    /// * `ttl` - Lifetime of the token
    pub fn for_identity(
        subject: impl ToString,
        username: impl ToString,
        issued_at: i64,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: Some(subject.to_string()),
            exp: Some(issued_at + ttl.num_seconds()),
            iat: Some(issued_at),
            username: Some(username.to_string()),
        }
    }

    /// Set subject.
    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Set username.
    pub fn with_username(mut self, username: impl ToString) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Check if token is expired.
    ///
    /// The expiry instant itself is already outside the validity window.
    /// Claims without `exp` count as expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(true, |exp| current_timestamp >= exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claims() {
        let claims = Claims::new().with_subject("user123");
        assert_eq!(claims.sub, Some("user123".to_string()));
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_for_identity() {
        let claims = Claims::for_identity("user123", "alice", 1_000, Duration::hours(24));

        assert_eq!(claims.sub, Some("user123".to_string()));
        assert_eq!(claims.username, Some("alice".to_string()));
        assert_eq!(claims.iat, Some(1_000));
        assert_eq!(claims.exp, Some(1_000 + 24 * 60 * 60));
    }

    #[test]
    fn test_builder_pattern() {
        let claims = Claims::new()
            .with_subject("user123")
            .with_expiration(1234567890)
            .with_issued_at(1234567800)
            .with_username("alice");

        assert_eq!(claims.sub, Some("user123".to_string()));
        assert_eq!(claims.exp, Some(1234567890));
        assert_eq!(claims.iat, Some(1234567800));
        assert_eq!(claims.username, Some("alice".to_string()));
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims::new().with_expiration(1000);

        assert!(!claims.is_expired(999));
        assert!(claims.is_expired(1000));
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_is_expired_no_exp_claim() {
        let claims = Claims::new();
        assert!(claims.is_expired(0));
    }

    #[test]
    fn test_absent_claims_are_not_serialized() {
        let json = serde_json::to_value(Claims::new().with_subject("s")).unwrap();
        assert_eq!(json, serde_json::json!({ "sub": "s" }));
    }
}
