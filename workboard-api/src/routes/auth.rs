/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token

use crate::{
    app::AppState,
    error::{validate_request, ApiJson, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use workboard_shared::services::session::TokenPair;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (length checked by the session service)
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token
    pub access_token: String,

    /// Its lifetime in seconds
    pub expires_in: i64,
}

/// Register a new user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Malformed name or email
/// - `400 Bad Request`: Password outside 8-128 characters
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    validate_request(&req)?;

    let user = state
        .session
        .register(&req.name, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            name: user.name,
            email: user.email,
        }),
    ))
}

/// Login endpoint
///
/// Returns an access/refresh token pair.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password, indistinguishably
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    validate_request(&req)?;

    let pair = state.session.authenticate(&req.email, &req.password).await?;
    Ok(Json(pair))
}

/// Exchanges a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or an access token
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = state.session.refresh(&req.refresh_token).await?;

    Ok(Json(RefreshResponse {
        access_token,
        expires_in: state.session.refreshed_expires_in(),
    }))
}
