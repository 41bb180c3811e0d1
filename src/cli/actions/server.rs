use crate::{
    APP_USER_AGENT,
    api::{
        self,
        auth::{AuthConfig, AuthState, Environment},
        guard::GuardMode,
    },
    cli::telemetry,
    store::{Database, PgCredentialStore},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub db_max_connections: u32,
    pub jwt_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub environment: Environment,
    pub bcrypt_cost: u32,
    pub guard_mode: GuardMode,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = Url::parse(&args.dsn).context("Invalid database connection string")?;
    log_startup_args(&args, &dsn);

    if args.guard_mode == GuardMode::PresenceOnly {
        warn!("Route guard accepts any session cookie without verifying it");
    }

    // The pool connects lazily; an unreachable database surfaces per request.
    let database = Arc::new(Database::new(args.dsn).with_max_connections(args.db_max_connections));
    let store = Arc::new(PgCredentialStore::new(database.clone()));

    let config = AuthConfig::new(args.jwt_secret)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_environment(args.environment)
        .with_bcrypt_cost(args.bcrypt_cost)
        .with_guard_mode(args.guard_mode);
    let auth_state = Arc::new(AuthState::new(config, store)?);

    let result = api::new(args.port, auth_state).await;

    database.shutdown().await;
    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args, dsn: &Url) {
    let mut redacted = dsn.clone();
    if redacted.password().is_some() {
        let _ = redacted.set_password(Some("***"));
    }

    info!("Starting {APP_USER_AGENT}");
    debug!(
        port = args.port,
        dsn = %redacted,
        db_max_connections = args.db_max_connections,
        session_ttl_seconds = args.session_ttl_seconds,
        environment = %args.environment,
        bcrypt_cost = args.bcrypt_cost,
        guard_mode = %args.guard_mode,
        "Startup configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dsn: &str) -> Args {
        Args {
            port: 0,
            dsn: dsn.to_string(),
            db_max_connections: 1,
            jwt_secret: SecretString::from("0123456789abcdef0123456789abcdef".to_string()),
            session_ttl_seconds: 60,
            environment: Environment::Development,
            bcrypt_cost: 4,
            guard_mode: GuardMode::Verify,
        }
    }

    #[tokio::test]
    async fn test_invalid_dsn_fails_before_serving() {
        let result = execute(args("not a url")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_args_debug_redacts_secret() {
        let debug = format!("{:?}", args("postgres://localhost/cointrack"));
        assert!(!debug.contains("0123456789abcdef"));
    }
}
