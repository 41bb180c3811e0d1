use crate::api::{auth::Environment, guard::GuardMode};
use crate::cli::{
    actions::{Action, server::Args},
    commands::auth,
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let db_max_connections = matches
        .get_one::<u32>("db-max-connections")
        .copied()
        .unwrap_or(5);

    let jwt_secret = matches
        .get_one::<String>(auth::ARG_JWT_SECRET)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --jwt-secret")?;

    let session_ttl_seconds = matches
        .get_one::<i64>(auth::ARG_SESSION_TTL_SECONDS)
        .copied()
        .context("missing argument: --session-ttl-seconds")?;
    let environment = matches
        .get_one::<Environment>(auth::ARG_ENVIRONMENT)
        .copied()
        .unwrap_or_default();
    let bcrypt_cost = matches
        .get_one::<u32>(auth::ARG_BCRYPT_COST)
        .copied()
        .context("missing argument: --bcrypt-cost")?;
    let guard_mode = matches
        .get_one::<GuardMode>(auth::ARG_GUARD_MODE)
        .copied()
        .unwrap_or_default();

    Ok(Action::Server(Args {
        port,
        dsn,
        db_max_connections,
        jwt_secret,
        session_ttl_seconds,
        environment,
        bcrypt_cost,
        guard_mode,
    }))
}
