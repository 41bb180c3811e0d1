//! In-process credential store, used by tests and local runs without Postgres.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, Credentials, NewUser, StoreError, User};

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, Credentials>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|credentials| credentials.user.id == id)
            .map(|credentials| credentials.user.clone()))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
        };
        users.insert(
            user.email.clone(),
            Credentials::new(user.clone(), new_user.password_hash),
        );
        Ok(user)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MIN_COST, hash_password};

    async fn new_user(email: &str, password: &str) -> anyhow::Result<NewUser> {
        Ok(NewUser {
            email: email.to_string(),
            name: "Alice".to_string(),
            password_hash: hash_password(password, MIN_COST).await?,
        })
    }

    #[tokio::test]
    async fn create_then_lookup() -> anyhow::Result<()> {
        let store = MemoryCredentialStore::new();
        let user = store
            .create_user(new_user("a@example.com", "correct").await?)
            .await?;

        let credentials = store
            .find_credentials("a@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("missing credentials"))?;
        assert_eq!(credentials.user, user);
        assert!(credentials.verify("correct").await?);
        assert!(!credentials.verify("wrong").await?);

        assert_eq!(store.find_user(user.id).await?, Some(user));
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() -> anyhow::Result<()> {
        let store = MemoryCredentialStore::new();
        store
            .create_user(new_user("a@example.com", "correct").await?)
            .await?;
        assert!(store.find_credentials("A@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() -> anyhow::Result<()> {
        let store = MemoryCredentialStore::new();
        store
            .create_user(new_user("a@example.com", "one").await?)
            .await?;
        let result = store
            .create_user(new_user("a@example.com", "two").await?)
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_is_none_not_error() -> anyhow::Result<()> {
        let store = MemoryCredentialStore::new();
        assert!(store.is_empty().await);
        assert!(store.find_credentials("nobody@example.com").await?.is_none());
        assert!(store.find_user(Uuid::new_v4()).await?.is_none());
        Ok(())
    }
}
