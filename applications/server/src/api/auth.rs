/// Authentication API routes
use crate::{
    api::{supplied, users::UserResponse},
    error::{tags, Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use worklog_core::{validation, ErrorKind, Role, User, UserPatch};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

impl AppState {
    fn auth_response(&self, user: &User) -> Result<Json<AuthResponse>> {
        Ok(Json(AuthResponse {
            token: self.auth_service.issue_token(user.id())?,
            user: UserResponse::from(user),
        }))
    }
}

/// POST /v1/auth/signup
/// Register a regular user and sign them in
pub async fn signup(
    State(app_state): State<AppState>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(req) = payload?;

    let mut user = User::new();
    user.set_name(req.name.as_deref().unwrap_or_default())?;
    user.set_email(req.email.as_deref().unwrap_or_default())?;
    user.set_password(req.password.as_deref().unwrap_or_default())?;
    user.set_role(Role::User);

    let user = app_state.users.add(&user).await?;
    tracing::info!(user_id = user.id(), "User signed up");

    app_state.auth_response(&user)
}

/// POST /v1/auth/signin
pub async fn signin(
    State(app_state): State<AppState>,
    payload: std::result::Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(req) = payload?;

    let email = validation::validate_email(req.email.as_deref().unwrap_or_default())?;
    let password = validation::validate_password(req.password.as_deref().unwrap_or_default())?;

    let user = app_state
        .users
        .find_by_email(email)
        .await?
        .ok_or(ServerError::Auth(tags::AUTH_ERROR))?;

    let matches = user.check_password(password).map_err(|e| {
        tracing::error!(user_id = user.id(), "Password check failed: {}", e.message());
        e
    })?;
    if !matches {
        tracing::debug!(user_id = user.id(), "Password mismatch");
        return Err(ServerError::Auth(tags::AUTH_ERROR));
    }

    app_state.auth_response(&user)
}

/// POST /v1/auth/signin-by-token
/// Exchange a valid token for a fresh one
pub async fn signin_by_token(
    State(app_state): State<AppState>,
    payload: std::result::Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(req) = payload?;
    let token = supplied(req.token.as_ref()).ok_or(ServerError::Auth(tags::NO_TOKEN))?;

    let user_id = app_state.auth_service.user_id(token).map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        ServerError::Auth(tags::BAD_TOKEN)
    })?;

    let user = app_state
        .users
        .get(user_id)
        .await?
        .ok_or(ServerError::Auth(ErrorKind::UserNotFound.as_str()))?;

    app_state.auth_response(&user)
}

/// PUT /v1/auth/password
/// Set a new password. The token travels in the body so that password
/// recovery links work without an `Authorization` header.
pub async fn change_password(
    State(app_state): State<AppState>,
    payload: std::result::Result<Json<PasswordRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(req) = payload?;
    let token = supplied(req.token.as_ref()).ok_or(ServerError::Invalid(tags::NO_TOKEN))?;

    let mut patch = UserPatch::new();
    patch.set_password(req.password.as_deref().unwrap_or_default())?;

    let user_id = app_state.auth_service.user_id(token).map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        ServerError::Invalid(tags::BAD_TOKEN)
    })?;

    let user = app_state.users.update(user_id, &patch).await?;
    tracing::info!(user_id, "Password changed");

    app_state.auth_response(&user)
}
