use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::identity::models::NewUserRecord;
use crate::domain::identity::models::UserId;
use crate::domain::identity::models::UserRecord;
use crate::domain::identity::ports::UserRepository;
use crate::identity::errors::StoreError;

/// Process-local user store.
///
/// Uniqueness checks and the insert happen under one write lock, so
/// concurrent registrations of the same username or email cannot both win.
pub struct InMemoryUserRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    last_id: i64,
    users: HashMap<UserId, UserRecord>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    async fn find_by<P>(&self, predicate: P) -> Result<UserRecord, StoreError>
    where
        P: Fn(&UserRecord) -> bool,
    {
        let state = self.state.read().await;

        state
            .users
            .values()
            .find(|user| predicate(user))
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<UserRecord, StoreError> {
        self.find_by(|user| user.username == username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.find_by(|user| user.email == email).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        let state = self.state.read().await;

        state.users.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn insert(&self, user: NewUserRecord) -> Result<UserId, StoreError> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("username".to_string()));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email".to_string()));
        }

        state.last_id += 1;
        let id = UserId(state.last_id);

        state.users.insert(
            id,
            UserRecord {
                id,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                is_active: user.is_active,
                created_at: user.created_at,
                updated_at: user.updated_at,
            },
        );

        Ok(id)
    }
}
