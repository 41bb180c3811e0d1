//! Credential store: user records and password verification.
//!
//! Only [`CredentialStore::find_credentials`] ever reads the password hash.
//! Every other lookup returns the sanitized [`User`] projection, which has no
//! field that could carry the hash.

mod database;
mod memory;
mod password;
mod postgres;

pub use database::Database;
pub use memory::MemoryCredentialStore;
pub use password::{MAX_COST, MIN_COST, hash_password, verify_password};
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Public view of a user, safe to return to clients.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A user together with the stored bcrypt hash. Only built during sign-in.
#[derive(Clone)]
pub struct Credentials {
    pub user: User,
    password_hash: String,
}

impl Credentials {
    #[must_use]
    pub fn new(user: User, password_hash: String) -> Self {
        Self {
            user,
            password_hash,
        }
    }

    /// Compare a plaintext password against the stored hash.
    ///
    /// # Errors
    /// Returns [`StoreError::Hash`] when the stored hash is malformed.
    pub async fn verify(&self, password: &str) -> Result<bool, StoreError> {
        verify_password(password, &self.password_hash).await
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password_hash", &"***")
            .finish()
    }
}

/// Fields for a new user; the password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential store unavailable")]
    Connection(#[source] sqlx::Error),
    #[error("credential store query failed")]
    Query(#[source] sqlx::Error),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("password hash error")]
    Hash(#[source] bcrypt::BcryptError),
    #[error("password hashing task failed")]
    Task(#[source] tokio::task::JoinError),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by exact email, including the password hash.
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError>;

    /// Look up a user by id using the default projection.
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a new user. Fails with [`StoreError::DuplicateEmail`] if the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_projection_has_no_password_field() -> anyhow::Result<()> {
        let user = User {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        let value = serde_json::to_value(&user)?;
        let object = value
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("user is not an object"))?;
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["email", "id", "name"]);
        Ok(())
    }

    #[test]
    fn credentials_debug_redacts_hash() {
        let credentials = Credentials::new(
            User {
                id: Uuid::nil(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
            "$2b$04$secret-hash".to_string(),
        );
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret-hash"));
        assert!(debug.contains("***"));
    }
}
