//! Postgres-backed credential store.

use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::{CredentialStore, Credentials, Database, NewUser, StoreError, User};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    database: Arc<Database>,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }
}

fn db_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
    }
}

/// Errors that mean the database could not be reached, as opposed to a failed statement.
fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Connection(err),
        _ => StoreError::Query(err),
    }
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| code.as_ref() == UNIQUE_VIOLATION),
        _ => false,
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        // The only statement that selects password_hash.
        let query = "SELECT id, name, email, password_hash FROM users WHERE email = $1";
        let pool = self.database.pool().await?;
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(pool)
            .instrument(db_span("SELECT", query))
            .await
            .map_err(classify)?;

        Ok(row.map(|row| Credentials::new(user_from_row(&row), row.get("password_hash"))))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = "SELECT id, name, email FROM users WHERE id = $1";
        let pool = self.database.pool().await?;
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(pool)
            .instrument(db_span("SELECT", query))
            .await
            .map_err(classify)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let query = r"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email
        ";
        let pool = self.database.pool().await?;
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.name)
            .fetch_one(pool)
            .instrument(db_span("INSERT", query))
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::DuplicateEmail
                } else {
                    classify(err)
                }
            })?;

        Ok(user_from_row(&row))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.ping().await
    }
}
