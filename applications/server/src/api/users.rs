/// User management API routes
use crate::{
    api::{int_field, path_id, supplied},
    error::Result,
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use worklog_core::{authorize, Action, ErrorKind, Role, User, UserPatch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Seconds per day, 0 when unset
    pub working_hours: u32,
    pub role: i64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email(),
            name: user.name().map(str::to_string),
            working_hours: user.working_hours(),
            role: user.role().value(),
        }
    }
}

/// Body of user create and update requests. Numeric fields are taken loosely
/// so that a wrong type surfaces as the field's own tag.
#[derive(Debug, Default, Deserialize)]
pub struct UserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub working_hours: Option<Value>,
    pub role: Option<Value>,
}

impl UserRequest {
    fn role_id(&self) -> Result<Option<i64>> {
        int_field(self.role.as_ref(), ErrorKind::BadRole)
    }

    fn working_hours(&self) -> Result<Option<i64>> {
        int_field(self.working_hours.as_ref(), ErrorKind::BadWorkingHours)
    }
}

/// POST /v1/users
/// Create a user (admins and managers)
pub async fn add_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    payload: std::result::Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    authorize(&caller, &Action::AddUser)?;
    let Json(req) = payload?;

    let mut user = User::new();
    user.set_name(req.name.as_deref().unwrap_or_default())?;
    user.set_email(req.email.as_deref().unwrap_or_default())?;
    user.set_password(req.password.as_deref().unwrap_or_default())?;
    if let Some(seconds) = req.working_hours()? {
        user.set_working_hours(seconds)?;
    }
    match req.role_id()? {
        Some(role_id) => user.set_role_id(role_id)?,
        None => user.set_role(Role::User),
    }

    let user = app_state.users.add(&user).await?;
    tracing::info!(user_id = user.id(), by = caller.id, "User created");

    Ok(Json(UserResponse::from(&user)))
}

/// GET /v1/users
pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<Vec<UserResponse>>> {
    authorize(&caller, &Action::ListUsers)?;

    let users = app_state.users.get_all().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// GET /v1/users/:id
pub async fn get_user(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<UserResponse>> {
    let id = path_id(&id)?;
    authorize(&caller, &Action::ViewUser { target: id })?;

    let user = app_state
        .users
        .get(id)
        .await?
        .ok_or(ErrorKind::UserNotFound)?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /v1/users/:id
/// Partial update; only the supplied fields change
pub async fn update_user(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    payload: std::result::Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let id = path_id(&id)?;
    let Json(req) = payload?;

    let role_id = req.role_id()?;
    authorize(
        &caller,
        &Action::UpdateUser {
            target: id,
            changes_role: role_id.is_some(),
        },
    )?;

    let mut patch = UserPatch::new();
    if let Some(name) = supplied(req.name.as_ref()) {
        patch.set_name(name)?;
    }
    if let Some(email) = supplied(req.email.as_ref()) {
        patch.set_email(email)?;
    }
    if let Some(seconds) = req.working_hours()? {
        patch.set_working_hours(seconds)?;
    }
    if let Some(role_id) = role_id {
        patch.set_role_id(role_id)?;
    }
    if let Some(password) = supplied(req.password.as_ref()) {
        patch.set_password(password)?;
    }

    let user = app_state.users.update(id, &patch).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /v1/users/:id
pub async fn delete_user(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<Value>> {
    let id = path_id(&id)?;
    authorize(&caller, &Action::DeleteUser { target: id })?;

    if !app_state.users.delete(id).await? {
        return Err(ErrorKind::UserNotFound.into());
    }
    tracing::info!(user_id = id, by = caller.id, "User deleted");

    Ok(Json(json!({ "success": true })))
}
