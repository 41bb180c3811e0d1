//! Route guard evaluated before any page is rendered.
//!
//! The decision itself ([`decide`]) is a pure function of the request path and
//! the session state; [`route_guard`] is the axum middleware that derives the
//! session state from the request and applies the decision.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::debug;

use super::handlers::auth::{AuthState, session::extract_session_token};

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const DASHBOARD_PATH: &str = "/dashboard";

const AUTH_PAGE_PREFIXES: [&str; 2] = ["/sign-in", "/sign-up"];
const EXCLUDED_PREFIXES: [&str; 3] = ["/api", "/static", "/assets"];
const EXCLUDED_PATHS: [&str; 1] = ["/favicon.ico"];

/// How the guard decides that a cookie represents a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GuardMode {
    /// Signature and expiry must verify; anything else counts as no session.
    #[default]
    Verify,
    /// Any `token` cookie counts as a session. Handlers still verify.
    PresenceOnly,
}

impl GuardMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::PresenceOnly => "presence-only",
        }
    }
}

impl FromStr for GuardMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "verify" => Ok(Self::Verify),
            "presence-only" => Ok(Self::PresenceOnly),
            other => Err(format!("unknown guard mode: {other}")),
        }
    }
}

impl fmt::Display for GuardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    ClaimsPresent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    RedirectToSignIn,
    RedirectToDashboard,
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Whether the guard applies to `path` at all.
#[must_use]
pub fn is_guarded(path: &str) -> bool {
    !(EXCLUDED_PATHS.contains(&path)
        || EXCLUDED_PREFIXES
            .iter()
            .any(|prefix| matches_prefix(path, prefix)))
}

/// Sign-in and sign-up pages, including anything nested below them.
#[must_use]
pub fn is_auth_page(path: &str) -> bool {
    AUTH_PAGE_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

#[must_use]
pub fn decide(path: &str, session: SessionState) -> GuardDecision {
    match (session, is_auth_page(path)) {
        (SessionState::Unauthenticated, false) => GuardDecision::RedirectToSignIn,
        (SessionState::ClaimsPresent, true) => GuardDecision::RedirectToDashboard,
        _ => GuardDecision::Pass,
    }
}

/// Derive the session state from the request cookies.
#[must_use]
pub fn session_state(auth_state: &AuthState, headers: &HeaderMap) -> SessionState {
    let Some(token) = extract_session_token(headers) else {
        return SessionState::Unauthenticated;
    };

    match auth_state.config().guard_mode() {
        GuardMode::PresenceOnly => SessionState::ClaimsPresent,
        GuardMode::Verify => match auth_state.signer().verify(&token) {
            Ok(_) => SessionState::ClaimsPresent,
            Err(err) => {
                debug!(expired = err.is_expired(), "Guard rejected session cookie: {err}");
                SessionState::Unauthenticated
            }
        },
    }
}

/// axum middleware; attach with `middleware::from_fn_with_state`.
pub async fn route_guard(
    State(auth_state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_guarded(&path) {
        return next.run(request).await;
    }

    match decide(&path, session_state(&auth_state, request.headers())) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::RedirectToSignIn => {
            debug!(path = %path, "Redirecting unauthenticated request to sign-in");
            Redirect::temporary(SIGN_IN_PATH).into_response()
        }
        GuardDecision::RedirectToDashboard => {
            debug!(path = %path, "Redirecting signed-in request to dashboard");
            Redirect::temporary(DASHBOARD_PATH).into_response()
        }
    }
}
