//! Session cookie helpers plus the session and sign-out endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{
    error::AuthError,
    state::{AuthConfig, AuthState},
    types::{ErrorResponse, SessionResponse, SignOutResponse},
};

pub const SESSION_COOKIE_NAME: &str = "token";

/// Build the `HttpOnly` cookie that carries the session token.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={ttl_seconds}"
    );
    // Secure only in production so local http development keeps working.
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Return the raw session cookie value, if the request carries one.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    // Browsers may send several Cookie headers over HTTP/2.
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Session is valid", body = SessionResponse),
        (status = 401, description = "Missing, invalid or expired session", body = ErrorResponse),
        (status = 500, description = "Credential store failure", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> Response {
    let Some(token) = extract_session_token(&headers) else {
        return AuthError::Unauthorized.into_response();
    };

    let claims = match auth_state.signer().verify(&token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("Rejected session token: {err}");
            return AuthError::Unauthorized.into_response();
        }
    };

    match auth_state.store().find_user(claims.user_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(SessionResponse { user })).into_response(),
        Ok(None) => {
            debug!(user_id = %claims.user_id, "Session refers to a missing user");
            AuthError::Unauthorized.into_response()
        }
        Err(err) => {
            let err = AuthError::from(err);
            err.log("session");
            err.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    responses(
        (status = 200, description = "Session cookie cleared", body = SignOutResponse)
    ),
    tag = "auth"
)]
pub async fn sign_out(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Tokens are stateless; clearing the cookie is all sign-out can do.
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::OK, headers, Json(SignOutResponse { success: true }))
}
