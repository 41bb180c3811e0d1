use clap::{Arg, Command, builder::ValueParser};

use crate::api::{
    auth::{Environment, MIN_SECRET_LENGTH},
    guard::GuardMode,
};
use crate::store::{MAX_COST, MIN_COST};

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";
pub const ARG_GUARD_MODE: &str = "guard-mode";

#[must_use]
pub fn validator_jwt_secret() -> ValueParser {
    ValueParser::from(move |secret: &str| -> std::result::Result<String, String> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(format!("secret must be at least {MIN_SECRET_LENGTH} bytes"));
        }
        Ok(secret.to_string())
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HMAC secret used to sign session tokens")
                .env("COINTRACK_JWT_SECRET")
                .hide_env_values(true)
                .required(true)
                .value_parser(validator_jwt_secret()),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token and cookie lifetime in seconds")
                .env("COINTRACK_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment; production marks the session cookie Secure")
                .env("COINTRACK_ENV")
                .default_value(Environment::Development.as_str())
                .value_parser(ValueParser::from(|value: &str| value.parse::<Environment>())),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt cost for new password hashes")
                .env("COINTRACK_BCRYPT_COST")
                .default_value("12")
                .value_parser(
                    clap::value_parser!(u32).range(i64::from(MIN_COST)..=i64::from(MAX_COST)),
                ),
        )
        .arg(
            Arg::new(ARG_GUARD_MODE)
                .long(ARG_GUARD_MODE)
                .help("How the route guard checks the session cookie: verify or presence-only")
                .env("COINTRACK_GUARD_MODE")
                .default_value(GuardMode::Verify.as_str())
                .value_parser(ValueParser::from(|value: &str| value.parse::<GuardMode>())),
        )
}
