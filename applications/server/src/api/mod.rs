/// API route modules
pub mod auth;
pub mod users;
pub mod version;
pub mod work;

use crate::{
    error::{Result, ServerError},
    middleware::auth_middleware,
    state::AppState,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use serde_json::Value;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use worklog_core::{validation, ErrorKind};

/// Build the `/v1` application router
pub fn router(app_state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/version", get(version::version))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/signin-by-token", post(auth::signin_by_token))
        .route("/auth/password", put(auth::change_password));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        // Users
        .route("/users", post(users::add_user).get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Work records
        .route("/work", post(work::add_record).get(work::list_records))
        .route(
            "/work/:id",
            get(work::get_record)
                .put(work::update_record)
                .delete(work::delete_record),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/v1", public_routes.merge(protected_routes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Entity id taken from the URL path
pub(crate) fn path_id(raw: &str) -> Result<i64> {
    let id = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ServerError::from(ErrorKind::BadId))?;
    Ok(validation::validate_id(id)?)
}

/// Integer from a JSON field that may arrive as a number or a numeric string.
///
/// Absent, null and blank values are `None`; anything else that is not a
/// whole number fails with `bad`.
pub(crate) fn int_field(value: Option<&Value>, bad: ErrorKind) -> Result<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| bad.into()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| bad.into()),
        Some(_) => Err(bad.into()),
    }
}

/// A string field counts as supplied only when it is non-empty
pub(crate) fn supplied(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}
