//! Session issuer: credential check and token minting.
//!
//! Unknown emails and wrong passwords both end in [`AuthError::InvalidCredentials`]
//! after a bcrypt comparison, so neither the response nor its latency tells a
//! caller whether an account exists.

use tracing::{debug, instrument};

use super::{
    error::{AuthError, CREDENTIALS_REQUIRED},
    state::AuthState,
};
use crate::store::{User, verify_password};

/// A freshly issued session.
#[derive(Debug)]
pub struct SignedIn {
    pub token: String,
    pub user: User,
}

/// Check `email`/`password` against the store and mint a session token.
///
/// # Errors
/// - [`AuthError::Validation`] when either field is empty.
/// - [`AuthError::InvalidCredentials`] for an unknown email or wrong password.
/// - [`AuthError::Internal`] when the store or signer fails.
#[instrument(skip(state, password))]
pub async fn sign_in(state: &AuthState, email: &str, password: &str) -> Result<SignedIn, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(CREDENTIALS_REQUIRED));
    }

    let Some(credentials) = state.store().find_credentials(email).await? else {
        debug!("No user for email");
        // Burn the same bcrypt cost as a real comparison; the result is irrelevant.
        let _ = verify_password(password, state.dummy_hash()).await?;
        return Err(AuthError::InvalidCredentials);
    };

    if !credentials.verify(password).await? {
        debug!("Password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    let token = state.signer().issue(credentials.user.id)?;

    Ok(SignedIn {
        token,
        user: credentials.user,
    })
}
