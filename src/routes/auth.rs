use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::dto::auth_dto::{AuthResponse, LoginPayload, RegisterPayload, UserProfile};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::utils::token::issue_token;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created", body = Json<AuthResponse>),
        (status = 400, description = "Invalid payload or email already in use")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .register(
            &payload.username,
            &payload.email,
            &payload.password,
            payload.role.as_deref(),
        )
        .await?;

    let token = issue_token(user.id, &user.role)?;
    let response = AuthResponse {
        token,
        user: UserProfile::from(user),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .verify_credentials(&payload.email, &payload.password)
        .await?;

    let token = issue_token(user.id, &user.role)?;
    let response = AuthResponse {
        token,
        user: UserProfile::from(user),
    };
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let user = state.user_service.find_by_id(user_id).await?;
    Ok(Json(UserProfile::from(user)))
}
