use std::sync::Arc;
use std::sync::OnceLock;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::clock::Clock;
use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenService;
use crate::jwt::TokenValidation;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// Built once at startup and shared read-only; the signing secret never
/// leaves it.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_service: TokenService,
    decoy_hash: OnceLock<String>,
}

const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Result of successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    /// Signed access token
    pub access_token: String,
    /// Instant after which the token is no longer accepted
    pub expires_at: DateTime<Utc>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator with the default password cost.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for token signing
    /// * `token_ttl` - Lifetime of issued tokens
    pub fn new(jwt_secret: &[u8], token_ttl: Duration) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            token_service: TokenService::new(jwt_secret, token_ttl),
            decoy_hash: OnceLock::new(),
        }
    }

    /// Replace the password hasher, e.g. one built with a configured cost.
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self.decoy_hash = OnceLock::new();
        self
    }

    /// Replace the clock used for token timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.token_service = self.token_service.with_clock(clock);
        self
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_service.ttl()
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Hash of a throwaway password with the current hasher's params.
    ///
    /// Computed on first use and cached.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn decoy_hash(&self) -> Result<&str, PasswordError> {
        if let Some(hash) = self.decoy_hash.get() {
            return Ok(hash);
        }
        let hash = self.password_hasher.hash(DECOY_PASSWORD)?;
        Ok(self.decoy_hash.get_or_init(|| hash))
    }

    /// Spend one full verification on a password that has no stored hash.
    ///
    /// Used when the username is unknown, so that rejecting it costs as much
    /// as rejecting a wrong password. Always `false`.
    pub fn verify_decoy(&self, password: &str) -> bool {
        match self.decoy_hash() {
            Ok(hash) => {
                self.password_hasher.verify(password, hash);
            }
            Err(e) => tracing::warn!(error = %e, "Decoy hash unavailable"),
        }
        false
    }

    /// Verify credentials and issue a token for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match the stored hash
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
        username: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.verify_password(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let issued = self.token_service.issue(subject, username)?;

        Ok(AuthenticationResult {
            access_token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Validate a presented token without reporting the cause of rejection.
    pub fn validate_token(&self, token: &str) -> TokenValidation {
        self.token_service.validate(token)
    }

    /// Validate a presented token and report the cause of rejection.
    ///
    /// # Errors
    /// * `JwtError` - Token is malformed, forged, incomplete, or expired
    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.token_service.verify(token)
    }
}
