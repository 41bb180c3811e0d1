//! Lazily connected Postgres pool shared by every request in the process.

use sqlx::{Connection, PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{Instrument, debug, info, info_span};

use super::StoreError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECONDS: u64 = 5;

/// Owns the connection string and the pool, connecting on first use.
///
/// The pool is initialized at most once; a failed attempt leaves the cell
/// empty so the next caller tries again. Call [`Database::shutdown`] before
/// the process exits.
#[derive(Debug)]
pub struct Database {
    dsn: String,
    max_connections: u32,
    acquire_timeout: Duration,
    pool: OnceCell<PgPool>,
}

impl Database {
    #[must_use]
    pub fn new(dsn: String) -> Self {
        Self {
            dsn,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECONDS),
            pool: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Use an already built pool instead of connecting on first use.
    #[cfg(test)]
    pub(crate) fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = OnceCell::from(pool);
        self
    }

    /// Return the shared pool, connecting if this is the first use.
    ///
    /// # Errors
    /// Returns [`StoreError::Connection`] if the database cannot be reached.
    pub async fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool
            .get_or_try_init(|| async {
                let span = info_span!("db.connect", db.system = "postgresql");
                let pool = PgPoolOptions::new()
                    .min_connections(1)
                    .max_connections(self.max_connections)
                    .acquire_timeout(self.acquire_timeout)
                    .max_lifetime(Duration::from_secs(60 * 2))
                    .test_before_acquire(true)
                    .connect(&self.dsn)
                    .instrument(span)
                    .await
                    .map_err(StoreError::Connection)?;
                info!("Connected to database");
                Ok::<_, StoreError>(pool)
            })
            .await
    }

    /// Whether the pool has been created.
    #[cfg(test)]
    pub(crate) fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// Acquire a connection and ping it.
    ///
    /// # Errors
    /// Returns [`StoreError::Connection`] if no healthy connection is available.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let pool = self.pool().await?;
        let mut conn = pool
            .acquire()
            .instrument(info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            ))
            .await
            .map_err(StoreError::Connection)?;
        conn.ping()
            .instrument(info_span!(
                "db.ping",
                db.system = "postgresql",
                db.operation = "PING"
            ))
            .await
            .map_err(StoreError::Connection)
    }

    /// Close the pool if it was ever opened.
    pub async fn shutdown(&self) {
        if let Some(pool) = self.pool.get() {
            debug!("closing database pool");
            pool.close().await;
        }
    }
}
