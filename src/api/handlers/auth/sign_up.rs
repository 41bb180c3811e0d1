use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    error::AuthError,
    state::AuthState,
    types::{ErrorResponse, SignUpRequest, SignUpResponse},
    utils::sign_up_input,
};
use crate::store::{NewUser, User, hash_password};

const INVALID_PAYLOAD: &str = "Invalid payload";

#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User created", body = SignUpResponse),
        (status = 400, description = "Invalid name, email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Credential store failure", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn sign_up(
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Invalid sign-up payload: {rejection}");
            return AuthError::Validation(INVALID_PAYLOAD).into_response();
        }
    };

    match register(&auth_state, request).await {
        Ok(user) => {
            info!(user_id = %user.id, "User registered");
            (
                StatusCode::CREATED,
                Json(SignUpResponse {
                    success: true,
                    user,
                }),
            )
                .into_response()
        }
        Err(err) => {
            err.log("sign-up");
            err.into_response()
        }
    }
}

async fn register(state: &AuthState, request: SignUpRequest) -> Result<User, AuthError> {
    let input = sign_up_input(&request)?;

    let password_hash = hash_password(input.password, state.config().bcrypt_cost()).await?;
    let user = state
        .store()
        .create_user(NewUser {
            email: input.email.to_string(),
            name: input.name.to_string(),
            password_hash,
        })
        .await?;

    Ok(user)
}
