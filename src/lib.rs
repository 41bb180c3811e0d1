//! # Cointrack (dashboard session authority)
//!
//! `cointrack` serves the crypto price dashboard and owns its sign-in flow:
//! credential checks against the user store, stateless session tokens carried
//! in an `HttpOnly` cookie, and a route guard that keeps unauthenticated
//! visitors on the auth pages.
//!
//! ## Sessions
//!
//! A successful sign-in mints an HS256 JWT with `{userId, iat, exp}` claims and
//! sets it as the `token` cookie. Nothing is stored server-side; a session ends
//! when the embedded expiry passes.
//!
//! ## Route Guard
//!
//! Every page request (everything outside `/api`, static assets and the
//! favicon) passes through the guard. By default the guard verifies the
//! token's signature and expiry; a forged or expired cookie is treated exactly
//! like a missing one. Operators can fall back to a presence-only check with
//! `--guard-mode presence-only`.
//!
//! ## Enumeration Safety
//!
//! Unknown emails and wrong passwords produce the same `401 Invalid
//! credentials` response, and both paths perform a bcrypt comparison.

pub mod api;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
