use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    error::{AuthError, CREDENTIALS_REQUIRED},
    issuer,
    session::session_cookie,
    state::AuthState,
    types::{ErrorResponse, SignInRequest, SignInResponse},
};

#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = SignInResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Unknown email or wrong password", body = ErrorResponse),
        (status = 500, description = "Credential store or signing failure", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn sign_in(
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = AuthError::Validation(CREDENTIALS_REQUIRED);
            tracing::debug!("Invalid sign-in payload: {rejection}");
            return err.into_response();
        }
    };

    let signed_in = match issuer::sign_in(&auth_state, &request.email, &request.password).await {
        Ok(signed_in) => signed_in,
        Err(err) => {
            err.log("sign-in");
            return err.into_response();
        }
    };

    // No cookie, no session: a header failure fails the whole sign-in.
    let cookie = match session_cookie(auth_state.config(), &signed_in.token) {
        Ok(cookie) => cookie,
        Err(err) => {
            let err = AuthError::Internal(err.into());
            err.log("sign-in");
            return err.into_response();
        }
    };

    info!(user_id = %signed_in.user.id, "User signed in");

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (
        StatusCode::OK,
        headers,
        Json(SignInResponse {
            success: true,
            user: signed_in.user,
        }),
    )
        .into_response()
}
