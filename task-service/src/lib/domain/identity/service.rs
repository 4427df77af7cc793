use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::TokenValidation;
use chrono::Utc;

use crate::identity::errors::IdentityError;
use crate::identity::models::AccessToken;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::LoginCommand;
use crate::identity::models::RegisterCommand;
use crate::identity::models::Username;
use crate::identity::ports::IdentityRepository;
use crate::identity::ports::IdentityServicePort;

/// Domain service implementation for identity operations.
///
/// Password hashing and verification are CPU bound and run on the blocking
/// pool so they never stall the request executor.
pub struct IdentityService<R>
where
    R: IdentityRepository,
{
    repository: Arc<R>,
    authenticator: Arc<Authenticator>,
}

impl<R> IdentityService<R>
where
    R: IdentityRepository,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store
    /// * `authenticator` - Hashing and token issuance, holding the signing secret
    pub fn new(repository: Arc<R>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }

    async fn with_authenticator<T, F>(&self, task: F) -> Result<T, IdentityError>
    where
        F: FnOnce(&Authenticator) -> T + Send + 'static,
        T: Send + 'static,
    {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || task(&authenticator))
            .await
            .map_err(|e| IdentityError::Unknown(format!("Blocking task failed: {}", e)))
    }

    /// Reject a login for a username with no identity, after the same
    /// Argon2 work a wrong password costs.
    async fn reject_unknown<T>(&self, password: String) -> Result<T, IdentityError> {
        self.with_authenticator(move |authenticator| authenticator.verify_decoy(&password))
            .await?;
        Err(IdentityError::InvalidCredentials)
    }
}

#[async_trait]
impl<R> IdentityServicePort for IdentityService<R>
where
    R: IdentityRepository,
{
    async fn register(&self, command: RegisterCommand) -> Result<Identity, IdentityError> {
        let password = command.password.into_inner();
        let password_hash = self
            .with_authenticator(move |authenticator| authenticator.hash_password(&password))
            .await??;

        let identity = Identity {
            id: IdentityId::new(),
            username: command.username,
            password_hash,
            created_at: Utc::now(),
        };

        let created = self.repository.create(identity).await?;

        tracing::info!(
            identity_id = %created.id,
            username = %created.username,
            "Identity registered"
        );

        Ok(created)
    }

    async fn login(&self, command: LoginCommand) -> Result<AccessToken, IdentityError> {
        let Ok(username) = Username::new(command.username) else {
            return self.reject_unknown(command.password).await;
        };

        let Some(identity) = self.repository.find_by_username(&username).await? else {
            return self.reject_unknown(command.password).await;
        };

        let password = command.password;
        let stored_hash = identity.password_hash.clone();
        let subject = identity.id.to_string();
        let username = identity.username.as_str().to_string();

        let result = self
            .with_authenticator(move |authenticator| {
                authenticator.authenticate(&password, &stored_hash, &subject, &username)
            })
            .await?
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => IdentityError::InvalidCredentials,
                AuthenticationError::JwtError(err) => IdentityError::Token(err),
            })?;

        tracing::info!(identity_id = %identity.id, "Access token issued");

        Ok(AccessToken {
            token: result.access_token,
            expires_at: result.expires_at,
        })
    }

    async fn resolve(&self, subject: &str) -> Result<Identity, IdentityError> {
        let id = IdentityId::from_string(subject)
            .map_err(|_| IdentityError::NotFound(subject.to_string()))?;

        self.repository
            .find_by_id(&id)
            .await?
            .ok_or(IdentityError::NotFound(subject.to_string()))
    }

    fn validate_token(&self, token: &str) -> TokenValidation {
        self.authenticator.validate_token(token)
    }

    async fn seed(&self, command: RegisterCommand) -> Result<Option<Identity>, IdentityError> {
        if self.repository.count().await? > 0 {
            tracing::debug!("Credential store not empty, skipping seed identity");
            return Ok(None);
        }

        self.register(command).await.map(Some)
    }
}
