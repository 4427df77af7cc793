use async_trait::async_trait;
use auth::TokenValidation;

use crate::identity::errors::IdentityError;
use crate::identity::models::AccessToken;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::LoginCommand;
use crate::identity::models::RegisterCommand;
use crate::identity::models::Username;

/// Port for identity and authentication use cases.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Register a new identity.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `Password` - Hashing failed
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<Identity, IdentityError>;

    /// Verify credentials and issue an access token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown username or wrong password, indistinguishably
    /// * `Token` - Token signing failed
    /// * `DatabaseError` - Store operation failed
    async fn login(&self, command: LoginCommand) -> Result<AccessToken, IdentityError>;

    /// Map a validated token subject back to its identity.
    ///
    /// # Errors
    /// * `NotFound` - Subject is not an identity ID or no longer exists
    /// * `DatabaseError` - Store operation failed
    async fn resolve(&self, subject: &str) -> Result<Identity, IdentityError>;

    /// Check a presented token's signature and expiry. No store access.
    fn validate_token(&self, token: &str) -> TokenValidation;

    /// Register `command` only when the store holds no identity yet.
    ///
    /// # Returns
    /// The seeded identity, or `None` when the store was not empty
    ///
    /// # Errors
    /// Same as [`IdentityServicePort::register`]
    async fn seed(&self, command: RegisterCommand) -> Result<Option<Identity>, IdentityError>;
}

/// Credential store.
///
/// Implementations must make `create` an atomic insert-if-absent on the
/// username.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist a new identity.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `DatabaseError` - Store operation failed
    async fn create(&self, identity: Identity) -> Result<Identity, IdentityError>;

    /// Retrieve identity by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError>;

    /// Retrieve identity by username.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_username(&self, username: &Username)
        -> Result<Option<Identity>, IdentityError>;

    /// Number of stored identities.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn count(&self) -> Result<u64, IdentityError>;
}
