//! Auth state and configuration shared by handlers and the route guard.

use secrecy::SecretString;
use std::{fmt, str::FromStr, sync::Arc};

use super::token::TokenSigner;
use crate::api::guard::GuardMode;
use crate::store::{CredentialStore, StoreError};

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
pub const MIN_SECRET_LENGTH: usize = 32;

// Compared against when an email is unknown so both rejection paths cost one bcrypt verify.
const TIMING_DUMMY_PASSWORD: &str = "cointrack-timing-equalizer";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    session_ttl_seconds: i64,
    environment: Environment,
    guard_mode: GuardMode,
    bcrypt_cost: u32,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            environment: Environment::default(),
            guard_mode: GuardMode::default(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_guard_mode(mut self, guard_mode: GuardMode) -> Self {
        self.guard_mode = guard_mode;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn guard_mode(&self) -> GuardMode {
        self.guard_mode
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.environment.is_production()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("environment", &self.environment)
            .field("guard_mode", &self.guard_mode)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

pub struct AuthState {
    config: AuthConfig,
    signer: TokenSigner,
    store: Arc<dyn CredentialStore>,
    dummy_hash: String,
}

impl AuthState {
    /// # Errors
    /// Returns [`StoreError::Hash`] if the configured bcrypt cost is out of range.
    pub fn new(config: AuthConfig, store: Arc<dyn CredentialStore>) -> Result<Self, StoreError> {
        let signer = TokenSigner::new(&config.jwt_secret, config.session_ttl_seconds);
        let dummy_hash =
            bcrypt::hash(TIMING_DUMMY_PASSWORD, config.bcrypt_cost).map_err(StoreError::Hash)?;
        Ok(Self {
            config,
            signer,
            store,
            dummy_hash,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    #[must_use]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub(super) fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }
}
