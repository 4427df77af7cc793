use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Username;
use crate::domain::identity::ports::IdentityRepository;
use crate::identity::errors::IdentityError;

/// Credential store held in process memory.
///
/// Used for local runs and tests. Both maps sit behind one lock so the
/// username check and the insert happen under the same write guard.
#[derive(Debug, Default)]
pub struct InMemoryIdentityRepository {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    identities: HashMap<IdentityId, Identity>,
    usernames: HashMap<Username, IdentityId>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove an identity, e.g. to simulate an account deleted after login.
    pub async fn remove(&self, id: &IdentityId) -> Option<Identity> {
        let mut state = self.state.write().await;
        let identity = state.identities.remove(id)?;
        state.usernames.remove(&identity.username);
        Some(identity)
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn create(&self, identity: Identity) -> Result<Identity, IdentityError> {
        let mut state = self.state.write().await;

        if state.usernames.contains_key(&identity.username) {
            return Err(IdentityError::UsernameAlreadyExists(
                identity.username.as_str().to_string(),
            ));
        }

        state
            .usernames
            .insert(identity.username.clone(), identity.id);
        state.identities.insert(identity.id, identity.clone());

        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError> {
        Ok(self.state.read().await.identities.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Identity>, IdentityError> {
        let state = self.state.read().await;
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.identities.get(id))
            .cloned())
    }

    async fn count(&self) -> Result<u64, IdentityError> {
        Ok(self.state.read().await.identities.len() as u64)
    }
}
