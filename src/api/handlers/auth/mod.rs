//! Auth handlers and supporting modules.
//!
//! This module owns sign-in (credential check and session issuance), sign-up,
//! session introspection and sign-out.
//!
//! ## Session Cookie
//!
//! Sessions are stateless: the `token` cookie holds an HS256 JWT and nothing
//! is recorded server-side. The cookie is always `HttpOnly`, `SameSite=Lax`,
//! `Path=/` with a 7 day `Max-Age`; `Secure` is added in production.
//!
//! ## Error Bodies
//!
//! Failures render `{"error": "<message>"}` with a fixed message per kind.
//! Unknown emails and wrong passwords share `401 Invalid credentials`; store
//! and signing failures share `500 Something went wrong`.

pub(crate) mod error;
pub(crate) mod issuer;
pub(crate) mod session;
pub(crate) mod sign_in;
pub(crate) mod sign_up;
mod state;
pub(crate) mod token;
pub(crate) mod types;
mod utils;

pub use error::AuthError;
pub use issuer::SignedIn;
pub use session::SESSION_COOKIE_NAME;
pub use state::{
    AuthConfig, AuthState, DEFAULT_BCRYPT_COST, DEFAULT_SESSION_TTL_SECONDS, Environment,
    MIN_SECRET_LENGTH,
};
pub use token::{SessionClaims, TokenError, TokenSigner};

#[cfg(test)]
mod tests;
