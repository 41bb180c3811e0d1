//! Sign-up input checks.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{error::AuthError, types::SignUpRequest};

const MIN_PASSWORD_LENGTH: usize = 8;

const NAME_REQUIRED: &str = "Name is required";
const INVALID_EMAIL: &str = "Invalid email";
const WEAK_PASSWORD: &str = "Password must be at least 8 characters";

static EMAIL_SHAPE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Sign-up fields after trimming. The password is kept verbatim.
#[derive(Debug)]
pub(super) struct SignUpInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Trim name and email, then check each field in order: name, email, password.
pub(super) fn sign_up_input(request: &SignUpRequest) -> Result<SignUpInput<'_>, AuthError> {
    let name = request.name.trim();
    let email = request.email.trim();

    if name.is_empty() {
        return Err(AuthError::Validation(NAME_REQUIRED));
    }
    if !valid_email(email) {
        return Err(AuthError::Validation(INVALID_EMAIL));
    }
    if !valid_password(&request.password) {
        return Err(AuthError::Validation(WEAK_PASSWORD));
    }

    Ok(SignUpInput {
        name,
        email,
        password: &request.password,
    })
}

/// Basic `local@domain.tld` shape check on a trimmed address.
fn valid_email(email: &str) -> bool {
    EMAIL_SHAPE
        .as_ref()
        .is_some_and(|regex| regex.is_match(email))
}

fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}
