/// Authentication middleware
use crate::{
    error::{tags, ServerError},
    state::AppState,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use worklog_core::Caller;

/// The caller resolved from a bearer token, with their current role.
/// Can be used as an extractor in handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Caller);

impl AuthenticatedUser {
    pub fn caller(&self) -> &Caller {
        &self.0
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that validates the bearer token and loads the caller's role.
///
/// The role is read from storage on every request, so role changes apply
/// to tokens issued before them.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or(ServerError::Auth(tags::NO_TOKEN))?;

    let user_id = state.auth_service.user_id(&token).map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        ServerError::Auth(tags::BAD_TOKEN)
    })?;

    let user = state.users.get(user_id).await?.ok_or_else(|| {
        ServerError::Forbidden(format!("token issued for missing user {user_id}"))
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser(Caller::new(user.id(), user.role())));

    Ok(next.run(request).await)
}

/// Implement FromRequestParts so AuthenticatedUser can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(ServerError::Auth(tags::NO_TOKEN))
    }
}
