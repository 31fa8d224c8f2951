use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{LoginRequest, LoginResponse, VerifyRequest, VerifyResponse},
    dtos::ErrorResponse,
    utils::ValidatedJson,
    AppState,
};

/// Request a magic link by email
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Magic link sent", body = LoginResponse),
        (status = 400, description = "Malformed JSON body", body = ErrorResponse),
        (status = 422, description = "Invalid email address", body = ErrorResponse),
        (status = 500, description = "Email delivery failed", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.magic_link.login(&req.email).await?;
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            message: "Magic link sent successfully".to_string(),
        }),
    ))
}

/// Verify a magic link token
#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Token valid", body = VerifyResponse),
        (status = 400, description = "Malformed JSON body", body = ErrorResponse),
        (status = 401, description = "Token expired or invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = state.magic_link.verify(&req.token)?;
    Ok((StatusCode::OK, Json(VerifyResponse { email })))
}
