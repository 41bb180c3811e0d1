//! Request-boundary errors for auth endpoints.
//!
//! Every variant renders a fixed, generic message; internal detail only goes
//! to the server log.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use super::{token::TokenError, types::ErrorResponse};
use crate::store::StoreError;

pub(crate) const CREDENTIALS_REQUIRED: &str = "Email and password are required";
pub(crate) const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub(crate) const INTERNAL_ERROR: &str = "Something went wrong";
pub(crate) const USER_EXISTS: &str = "User already exists";
pub(crate) const UNAUTHORIZED: &str = "Unauthorized";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(&'static str),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already exists")]
    Conflict,
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::Conflict,
            other => Self::Internal(other.into()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.into())
    }
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::Validation(message) => *message,
            Self::InvalidCredentials => INVALID_CREDENTIALS,
            Self::Conflict => USER_EXISTS,
            Self::Unauthorized => UNAUTHORIZED,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// Log the failure with the operation name, at a level matching its severity.
    pub(crate) fn log(&self, operation: &'static str) {
        match self {
            Self::Internal(err) => error!(operation, "{operation} failed: {err:#}"),
            Self::InvalidCredentials | Self::Conflict => {
                warn!(operation, "{operation} rejected: {self}");
            }
            Self::Validation(_) | Self::Unauthorized => {
                debug!(operation, "{operation} rejected: {self}");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.client_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
