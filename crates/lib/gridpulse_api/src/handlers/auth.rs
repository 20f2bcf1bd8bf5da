//! Account request handlers.

use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::Payload;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserData};
use crate::services::auth;

/// `POST /api/v1/user/register`: create an account and issue its first tokens.
pub async fn register_handler(
    State(state): State<AppState>,
    Payload(body): Payload<RegisterRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::register(&state, &body).await?;
    Ok(Json(resp))
}

/// `POST /api/v1/user/login`: authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Payload(body): Payload<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(&state, &body).await?;
    Ok(Json(resp))
}

/// `POST /api/v1/user/refresh`: exchange a refresh token for a new access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Payload(body): Payload<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::refresh(&state, &body.refresh_token).await?;
    Ok(Json(resp))
}

/// `GET /api/v1/user`: the account behind the bearer token.
pub async fn current_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserData>> {
    let resp = auth::current_user(&state, &claims.sub).await?;
    Ok(Json(resp))
}
